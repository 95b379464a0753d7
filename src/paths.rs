//! Path helpers shared by the planner, the executor and the bulk linker.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve `path` to an absolute, symlink-free form even when its tail does
/// not exist yet.
///
/// The deepest existing ancestor is canonicalized and the missing components
/// are appended to it unchanged.
///
/// # Errors
/// Returns an `io::Error` if the current directory cannot be read or an
/// existing ancestor cannot be canonicalized for a reason other than absence.
pub fn resolve_soft(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let normalized = normalize_lexically(&absolute);

    let mut existing = normalized.as_path();
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(mut resolved) => {
                for name in missing.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Ok(normalized.clone()),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Like [`resolve_soft`], but the final component is kept as is, so a symlink
/// sitting at `path` names itself rather than its target.
///
/// # Errors
/// Returns any error of [`resolve_soft`] on the parent directory.
pub fn resolve_entry(path: &Path) -> io::Result<PathBuf> {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => Ok(resolve_soft(parent)?.join(name)),
        _ => resolve_soft(path),
    }
}

/// Containment test on resolved paths (component-wise, not a string prefix).
#[must_use]
pub fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// True if anything sits at `path`, including a dangling symlink.
#[must_use]
pub fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// True if `path` is a symlink whose target cannot be resolved.
///
/// # Errors
/// Returns an `io::Error` when resolution fails for a reason other than a
/// missing target (e.g. a symlink loop or a permission problem).
pub fn is_broken_symlink(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {}
        Ok(_) => return Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    }
    match fs::metadata(path) {
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

/// True if `path` is a real directory (a symlink to one does not count).
#[must_use]
pub fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

/// `name (n).ext`, or `name (n)` for directories and extensionless names.
#[must_use]
pub fn rename_candidate(path: &Path, n: u32) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let candidate = match (is_real_dir(path), path.extension()) {
        (false, Some(ext)) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{stem} ({n}).{}", ext.to_string_lossy())
        }
        _ => format!("{name} ({n})"),
    };
    path.with_file_name(candidate)
}

/// File name without its final extension
#[must_use]
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
