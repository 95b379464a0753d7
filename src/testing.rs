//! Testing utilities for sidecar-handler
//!
//! Provides a `Fixture` holding a temporary tree with a source directory (the
//! primary file before the rename) and a destination directory (after it).
//!
//! Only available when compiled with `cfg(test)`.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary `src/` + `dst/` layout with one primary file in each.
///
/// The whole tree is removed when the fixture is dropped.
pub struct Fixture {
    temp: TempDir,
    src_name: String,
    dst_name: String,
}

impl Fixture {
    /// `src/old.flac` renamed to `dst/new.flac`
    ///
    /// # Panics
    /// Panics if the temporary tree cannot be created.
    pub fn new() -> Self {
        Self::with_names("old.flac", "new.flac")
    }

    /// Custom primary file names in `src/` and `dst/`
    ///
    /// # Panics
    /// Panics if the temporary tree cannot be created.
    pub fn with_names(src_name: &str, dst_name: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let fixture = Self {
            temp,
            src_name: src_name.to_string(),
            dst_name: dst_name.to_string(),
        };
        fs::create_dir_all(fixture.src_dir()).expect("Failed to create src dir");
        fs::create_dir_all(fixture.dst_dir()).expect("Failed to create dst dir");
        fs::write(fixture.src_primary(), b"").expect("Failed to create source primary");
        fs::write(fixture.dst_primary(), b"").expect("Failed to create destination primary");
        fixture
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    #[must_use]
    pub fn src_dir(&self) -> PathBuf {
        self.root().join("src")
    }

    /// Canonical form of `src_dir`, as the planner reports sources
    ///
    /// # Panics
    /// Panics if the directory cannot be canonicalized.
    #[must_use]
    pub fn src_root(&self) -> PathBuf {
        fs::canonicalize(self.src_dir()).expect("Failed to canonicalize src dir")
    }

    #[must_use]
    pub fn dst_dir(&self) -> PathBuf {
        self.root().join("dst")
    }

    #[must_use]
    pub fn src_primary(&self) -> PathBuf {
        self.src_dir().join(&self.src_name)
    }

    #[must_use]
    pub fn dst_primary(&self) -> PathBuf {
        self.dst_dir().join(&self.dst_name)
    }

    /// Write a file below `src/`, creating parent directories
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn write_src(&self, rel: &str, content: &str) {
        write_with_parents(&self.src_dir().join(rel), content);
    }

    /// Write a file below `dst/`, creating parent directories
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn write_dst(&self, rel: &str, content: &str) {
        write_with_parents(&self.dst_dir().join(rel), content);
    }

    /// # Panics
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read_src(&self, rel: &str) -> String {
        fs::read_to_string(self.src_dir().join(rel)).expect("Failed to read src file")
    }

    /// # Panics
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read_dst(&self, rel: &str) -> String {
        fs::read_to_string(self.dst_dir().join(rel)).expect("Failed to read dst file")
    }
}

/// Write `content` to `path`, creating any missing parent directories
///
/// # Panics
/// Panics if a directory or the file cannot be created.
pub fn write_with_parents(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write test file");
}
