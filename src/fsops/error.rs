use std::path::PathBuf;
use thiserror::Error;

/// Failures while applying planned operations or creating links
#[derive(Debug, Error)]
pub enum FsError {
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk failed while copying a tree
    #[error("Error while walking directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Every `name (n)` candidate up to the probe bound is taken
    #[error("Could not find a free name for {}", path.display())]
    NoFreeName { path: PathBuf },

    /// Destination was taken again between conflict resolution and creation
    #[error("Destination not free after conflict resolution: {}", path.display())]
    DestinationNotFree { path: PathBuf },
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, FsError>;
