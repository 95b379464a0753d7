use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::{ConflictPolicy, MoveMode};

/// One planned filesystem change, consumed immediately by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Move or copy a single sidecar file
    File {
        src: PathBuf,
        dst: PathBuf,
        mode: MoveMode,
        conflict: ConflictPolicy,
    },
    /// Move or copy a whole directory of extras
    Tree {
        src_dir: PathBuf,
        dst_dir: PathBuf,
        mode: MoveMode,
        conflict: ConflictPolicy,
    },
}

impl Operation {
    #[must_use]
    pub fn src(&self) -> &Path {
        match self {
            Self::File { src, .. } => src,
            Self::Tree { src_dir, .. } => src_dir,
        }
    }

    #[must_use]
    pub fn dst(&self) -> &Path {
        match self {
            Self::File { dst, .. } => dst,
            Self::Tree { dst_dir, .. } => dst_dir,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> MoveMode {
        match self {
            Self::File { mode, .. } | Self::Tree { mode, .. } => *mode,
        }
    }

    #[must_use]
    pub const fn conflict(&self) -> ConflictPolicy {
        match self {
            Self::File { conflict, .. } | Self::Tree { conflict, .. } => *conflict,
        }
    }

    #[must_use]
    pub const fn is_tree(&self) -> bool {
        matches!(self, Self::Tree { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = if self.is_tree() { "tree" } else { "file" };
        write!(
            f,
            "{} {what} {} -> {} (on conflict: {})",
            self.mode(),
            self.src().display(),
            self.dst().display(),
            self.conflict()
        )
    }
}
