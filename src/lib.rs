//! Sidecar Handler - keeps auxiliary files in sync with renamed media files
//!
//! A primary media file (a FLAC track, say) is often accompanied by *sidecars*:
//! lyrics, cue sheets, liner notes, checksums, whole folders of extras. This
//! library plans and executes the moves/copies that keep those sidecars next to
//! the primary file when it is renamed or relocated, and provides a bulk linker
//! that attaches lyrics and cover art across a music tree.
//!
//! - [`rules`]: sidecar rule model, validation and storage format
//! - [`engine`]: rule-based operation planner
//! - [`fsops`]: conflict-safe executor for planned operations
//! - [`links`]: bulk attach / cleanup of lyrics and cover links
//! - [`hooks`]: adapter for host applications with pre/post-save callbacks
//!
//! All operations are synchronous and assume a single writer per directory tree.

use thiserror::Error;

pub mod cli;
pub mod config;
pub mod engine;
pub mod fsops;
pub mod hooks;
pub mod links;
pub mod output;
pub mod paths;
pub mod rules;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{Metadata, Operation, plan_operations};
pub use fsops::{FsError, apply_operations};
pub use rules::{ConfigError, SidecarRule};
pub use types::{ConflictPolicy, LinkType, MoveMode};

/// Error enum, contains all failure states of the library
#[derive(Debug, Error)]
pub enum SidecarError {
    /// Invalid rules, missing embedded tags, path escapes
    #[error("Configuration error: {0}")]
    Config(#[from] rules::ConfigError),
    /// Failure while applying an operation
    #[error("Filesystem error: {0}")]
    Fs(#[from] fsops::FsError),
    /// Settings file could not be read or written
    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SidecarError {
    /// True for errors caused by rule definitions rather than the filesystem
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, SidecarError>;
