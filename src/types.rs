//! Value enums shared by the planner, the executor and the bulk linker.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether matched sidecars are relocated or duplicated
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveMode {
    /// Relocate the sidecar next to the renamed primary file
    #[default]
    Move,
    /// Leave the original in place and duplicate it
    Copy,
}

impl MoveMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for MoveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a destination path is already occupied
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Leave the existing destination alone and do nothing
    #[default]
    Skip,
    /// Remove the existing destination first
    Overwrite,
    /// Pick the first free `name (n).ext`
    Rename,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::Rename => "rename",
        })
    }
}

/// How the bulk linker materializes an attached sidecar
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Symlink, then hardlink, then copy
    #[default]
    Auto,
    Symlink,
    Hardlink,
    Copy,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Symlink => "symlink",
            Self::Hardlink => "hardlink",
            Self::Copy => "copy",
        })
    }
}
