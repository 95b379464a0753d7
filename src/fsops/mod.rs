//! Operation executor
//!
//! Applies planned [`Operation`]s in order. Each operation resolves its own
//! destination conflict and then moves or copies; there is no transaction, so
//! an error on one operation leaves earlier ones applied and is returned to the
//! caller, who decides whether to continue.
//!
//! Conflict resolution probes for a free name and then acts on it. The probe
//! and the write are not atomic: concurrent writers against the same tree can
//! race. A single writer per tree is assumed.

pub mod error;

pub use error::{FsError, Result};

use std::fs::{self, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::engine::Operation;
use crate::paths::{is_occupied, is_real_dir, rename_candidate, resolve_entry};
use crate::types::{ConflictPolicy, MoveMode};

/// Highest `n` tried for `name (n).ext` under the rename policy
pub const MAX_RENAME_CANDIDATES: u32 = 9_999;

/// Decide where a sidecar may be written.
///
/// Returns the destination to use, or `None` when the policy says to skip.
/// A destination counts as taken when anything is there, including a dangling
/// symlink. Under [`ConflictPolicy::Overwrite`] the existing entry is removed
/// (recursively for directories) before returning.
///
/// # Errors
/// Returns `FsError::Io` if the existing destination cannot be removed and
/// `FsError::NoFreeName` if every rename candidate is taken.
pub fn resolve_conflict(dst: &Path, policy: ConflictPolicy) -> Result<Option<PathBuf>> {
    resolve_conflict_bounded(dst, policy, MAX_RENAME_CANDIDATES)
}

fn resolve_conflict_bounded(
    dst: &Path,
    policy: ConflictPolicy,
    max_candidates: u32,
) -> Result<Option<PathBuf>> {
    if !is_occupied(dst) {
        return Ok(Some(dst.to_path_buf()));
    }

    match policy {
        ConflictPolicy::Skip => {
            debug!("Conflict: skip {}", dst.display());
            Ok(None)
        }
        ConflictPolicy::Overwrite => {
            remove_existing(dst)?;
            Ok(Some(dst.to_path_buf()))
        }
        ConflictPolicy::Rename => (1..=max_candidates)
            .map(|n| rename_candidate(dst, n))
            .find(|candidate| !is_occupied(candidate))
            .map(Some)
            .ok_or_else(|| FsError::NoFreeName {
                path: dst.to_path_buf(),
            }),
    }
}

fn remove_existing(path: &Path) -> io::Result<()> {
    let removed = if is_real_dir(path) {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match removed {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Apply every operation in order, stopping at the first error.
///
/// # Errors
/// Returns the first error raised by [`apply_operation`].
pub fn apply_operations(ops: &[Operation]) -> Result<()> {
    for op in ops {
        apply_operation(op)?;
    }
    Ok(())
}

/// Apply one operation.
///
/// Returns the path actually written, or `None` if the conflict policy
/// skipped it.
///
/// # Errors
/// Returns `FsError` when conflict resolution, directory creation, or the
/// move/copy itself fails.
pub fn apply_operation(op: &Operation) -> Result<Option<PathBuf>> {
    if resolve_entry(op.src())? == resolve_entry(op.dst())? {
        debug!("Sidecar already in place: {}", op.dst().display());
        return Ok(Some(op.dst().to_path_buf()));
    }

    let Some(dst) = resolve_conflict(op.dst(), op.conflict())? else {
        info!("Skip sidecar (exists): {}", op.dst().display());
        return Ok(None);
    };
    ensure_parent(&dst)?;

    match (op, op.mode()) {
        (Operation::File { src, .. }, MoveMode::Copy) => {
            copy_file(src, &dst)?;
            info!("Copied sidecar: {} -> {}", src.display(), dst.display());
        }
        (Operation::File { src, .. }, MoveMode::Move) => {
            move_file(src, &dst)?;
            info!("Moved sidecar: {} -> {}", src.display(), dst.display());
        }
        (Operation::Tree { src_dir, .. }, MoveMode::Copy) => {
            copy_tree(src_dir, &dst)?;
            info!("Copied sidecar tree: {} -> {}", src_dir.display(), dst.display());
        }
        (Operation::Tree { src_dir, .. }, MoveMode::Move) => {
            move_tree(src_dir, &dst)?;
            info!("Moved sidecar tree: {} -> {}", src_dir.display(), dst.display());
        }
    }
    Ok(Some(dst))
}

/// Create the parent directory of `path` if needed
///
/// # Errors
/// Returns an `io::Error` if the directory cannot be created.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Copy file contents, permissions and timestamps.
///
/// # Errors
/// Returns an `io::Error` if the contents cannot be copied.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst)?;
    if let Err(e) = copy_times(src, dst) {
        debug!("Could not preserve timestamps on {}: {e}", dst.display());
    }
    Ok(())
}

fn copy_times(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    let mut times = FileTimes::new().set_modified(meta.modified()?);
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    let file = fs::File::options()
        .write(true)
        .open(dst)
        .or_else(|_| fs::File::open(dst))?;
    file.set_times(times)
}

fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Err(e) = fs::rename(src, dst) {
        debug!("Rename failed ({e}), falling back to copy+remove");
        copy_file(src, dst)?;
        fs::remove_file(src)?;
    }
    Ok(())
}

/// Recursively copy a directory; symlinks inside it are copied as the files
/// or directories they point to.
///
/// # Errors
/// Returns `FsError` if the walk, a directory creation, or a file copy fails.
pub fn copy_tree(src_dir: &Path, dst_dir: &Path) -> Result<()> {
    for entry in WalkDir::new(src_dir).follow_links(true) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src_dir) else {
            continue;
        };
        let target = dst_dir.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            ensure_parent(&target)?;
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn move_tree(src_dir: &Path, dst_dir: &Path) -> Result<()> {
    if let Err(e) = fs::rename(src_dir, dst_dir) {
        debug!("Rename failed ({e}), falling back to copy+remove");
        copy_tree(src_dir, dst_dir)?;
        fs::remove_dir_all(src_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::plan_operations;
    use crate::rules::SidecarRule;
    use crate::testing::Fixture;

    fn file_op(fx: &Fixture, mode: MoveMode, conflict: ConflictPolicy) -> Operation {
        Operation::File {
            src: fx.src_dir().join("old.lrc"),
            dst: fx.dst_dir().join("new.lrc"),
            mode,
            conflict,
        }
    }

    #[test]
    fn test_free_destination_used_as_is() {
        let fx = Fixture::new();
        let dst = fx.dst_dir().join("new.lrc");
        for policy in [ConflictPolicy::Skip, ConflictPolicy::Overwrite, ConflictPolicy::Rename] {
            assert_eq!(resolve_conflict(&dst, policy).unwrap(), Some(dst.clone()));
        }
    }

    #[test]
    fn test_rename_probes_next_free_slot() {
        let fx = Fixture::new();
        fx.write_dst("new.lrc", "a");
        fx.write_dst("new (1).lrc", "b");
        let resolved = resolve_conflict(&fx.dst_dir().join("new.lrc"), ConflictPolicy::Rename).unwrap();
        assert_eq!(resolved, Some(fx.dst_dir().join("new (2).lrc")));
    }

    #[test]
    fn test_rename_bound_exhausted() {
        let fx = Fixture::new();
        fx.write_dst("new.lrc", "a");
        fx.write_dst("new (1).lrc", "b");
        fx.write_dst("new (2).lrc", "c");
        let err = resolve_conflict_bounded(&fx.dst_dir().join("new.lrc"), ConflictPolicy::Rename, 2)
            .unwrap_err();
        assert!(matches!(err, FsError::NoFreeName { .. }));
    }

    #[test]
    fn test_overwrite_removes_directory() {
        let fx = Fixture::new();
        fx.write_dst("new.extras/inner.txt", "old");
        let dst = fx.dst_dir().join("new.extras");
        let resolved = resolve_conflict(&dst, ConflictPolicy::Overwrite).unwrap();
        assert_eq!(resolved, Some(dst.clone()));
        assert!(!dst.exists());
    }

    #[test]
    fn test_skip_leaves_both_files() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "from-src");
        fx.write_dst("new.lrc", "already");

        let written = apply_operation(&file_op(&fx, MoveMode::Move, ConflictPolicy::Skip)).unwrap();

        assert_eq!(written, None);
        assert_eq!(fx.read_dst("new.lrc"), "already");
        assert_eq!(fx.read_src("old.lrc"), "from-src");
    }

    #[test]
    fn test_overwrite_replaces_and_moves() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "from-src");
        fx.write_dst("new.lrc", "already");

        apply_operation(&file_op(&fx, MoveMode::Move, ConflictPolicy::Overwrite)).unwrap();

        assert_eq!(fx.read_dst("new.lrc"), "from-src");
        assert!(!fx.src_dir().join("old.lrc").exists());
    }

    #[test]
    fn test_rename_keeps_existing() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "from-src");
        fx.write_dst("new.lrc", "already");

        let written = apply_operation(&file_op(&fx, MoveMode::Move, ConflictPolicy::Rename)).unwrap();

        assert_eq!(written, Some(fx.dst_dir().join("new (1).lrc")));
        assert_eq!(fx.read_dst("new.lrc"), "already");
        assert_eq!(fx.read_dst("new (1).lrc"), "from-src");
        assert!(!fx.src_dir().join("old.lrc").exists());
    }

    #[test]
    fn test_copy_keeps_source_and_mtime() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "lyrics");
        let src = fx.src_dir().join("old.lrc");
        let mtime = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        apply_operation(&file_op(&fx, MoveMode::Copy, ConflictPolicy::Skip)).unwrap();

        assert_eq!(fx.read_src("old.lrc"), "lyrics");
        assert_eq!(fx.read_dst("new.lrc"), "lyrics");
        let copied = fs::metadata(fx.dst_dir().join("new.lrc")).unwrap();
        assert_eq!(copied.modified().unwrap(), mtime);
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "lyrics");
        let op = Operation::File {
            src: fx.src_dir().join("old.lrc"),
            dst: fx.dst_dir().join("deep/er/new.lrc"),
            mode: MoveMode::Move,
            conflict: ConflictPolicy::Skip,
        };
        apply_operation(&op).unwrap();
        assert_eq!(fx.read_dst("deep/er/new.lrc"), "lyrics");
    }

    #[test]
    fn test_tree_move_and_copy() {
        let fx = Fixture::new();
        fx.write_src("old.extras/nested/a.txt", "a");
        fx.write_src("old.scans/b.txt", "b");

        apply_operations(&[
            Operation::Tree {
                src_dir: fx.src_dir().join("old.extras"),
                dst_dir: fx.dst_dir().join("new.extras"),
                mode: MoveMode::Move,
                conflict: ConflictPolicy::Rename,
            },
            Operation::Tree {
                src_dir: fx.src_dir().join("old.scans"),
                dst_dir: fx.dst_dir().join("new.scans"),
                mode: MoveMode::Copy,
                conflict: ConflictPolicy::Rename,
            },
        ])
        .unwrap();

        assert!(!fx.src_dir().join("old.extras").exists());
        assert_eq!(fx.read_dst("new.extras/nested/a.txt"), "a");
        assert_eq!(fx.read_src("old.scans/b.txt"), "b");
        assert_eq!(fx.read_dst("new.scans/b.txt"), "b");
    }

    #[test]
    fn test_tree_rename_conflict_uses_plain_suffix() {
        let fx = Fixture::new();
        fx.write_src("old.extras/a.txt", "new");
        fx.write_dst("new.extras/a.txt", "existing");

        let written = apply_operation(&Operation::Tree {
            src_dir: fx.src_dir().join("old.extras"),
            dst_dir: fx.dst_dir().join("new.extras"),
            mode: MoveMode::Move,
            conflict: ConflictPolicy::Rename,
        })
        .unwrap();

        assert_eq!(written, Some(fx.dst_dir().join("new.extras (1)")));
        assert_eq!(fx.read_dst("new.extras/a.txt"), "existing");
        assert_eq!(fx.read_dst("new.extras (1)/a.txt"), "new");
    }

    #[test]
    fn test_same_path_is_a_no_op() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "keep");
        let op = Operation::File {
            src: fx.src_dir().join("old.lrc"),
            dst: fx.src_dir().join("old.lrc"),
            mode: MoveMode::Move,
            conflict: ConflictPolicy::Overwrite,
        };
        apply_operation(&op).unwrap();
        assert_eq!(fx.read_src("old.lrc"), "keep");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_destination_is_replaced_on_overwrite() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "from-src");
        let src = fx.src_dir().join("old.lrc");
        let dst = fx.dst_dir().join("new.lrc");
        std::os::unix::fs::symlink(&src, &dst).unwrap();

        let written = apply_operation(&file_op(&fx, MoveMode::Move, ConflictPolicy::Overwrite)).unwrap();

        assert_eq!(written, Some(dst.clone()));
        assert!(!is_occupied(&src));
        assert!(!fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
        assert_eq!(fx.read_dst("new.lrc"), "from-src");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_destination_gets_renamed_slot() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "from-src");
        let src = fx.src_dir().join("old.lrc");
        std::os::unix::fs::symlink(&src, fx.dst_dir().join("new.lrc")).unwrap();

        let written = apply_operation(&file_op(&fx, MoveMode::Copy, ConflictPolicy::Rename)).unwrap();

        assert_eq!(written, Some(fx.dst_dir().join("new (1).lrc")));
        assert_eq!(fx.read_dst("new (1).lrc"), "from-src");
        assert_eq!(fx.read_src("old.lrc"), "from-src");
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_copy_follows_symlinked_subdirectory() {
        let fx = Fixture::new();
        fx.write_src("old.extras/notes.txt", "notes");
        fx.write_src("scans/front.jpg", "jpg");
        std::os::unix::fs::symlink(fx.src_dir().join("scans"), fx.src_dir().join("old.extras/scans"))
            .unwrap();

        apply_operation(&Operation::Tree {
            src_dir: fx.src_dir().join("old.extras"),
            dst_dir: fx.dst_dir().join("new.extras"),
            mode: MoveMode::Copy,
            conflict: ConflictPolicy::Skip,
        })
        .unwrap();

        let copied = fx.dst_dir().join("new.extras/scans");
        assert!(fs::symlink_metadata(&copied).unwrap().is_dir());
        assert_eq!(fx.read_dst("new.extras/scans/front.jpg"), "jpg");
        assert_eq!(fx.read_dst("new.extras/notes.txt"), "notes");
        assert_eq!(fx.read_src("scans/front.jpg"), "jpg");
    }

    #[test]
    fn test_error_does_not_roll_back_earlier_operations() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "lyrics");
        let ops = vec![
            file_op(&fx, MoveMode::Move, ConflictPolicy::Skip),
            Operation::File {
                src: fx.src_dir().join("missing.cue"),
                dst: fx.dst_dir().join("new.cue"),
                mode: MoveMode::Move,
                conflict: ConflictPolicy::Skip,
            },
        ];
        assert!(apply_operations(&ops).is_err());
        assert_eq!(fx.read_dst("new.lrc"), "lyrics");
    }

    #[test]
    fn test_planned_operations_apply_end_to_end() {
        let fx = Fixture::new();
        fx.write_src("old.lrc", "lyrics");
        fx.write_src("old.cue", "cue");
        let rules = vec![
            SidecarRule::external("lyrics", "{base}.lrc"),
            SidecarRule::external("cue", "{base}.cue").with_mode(MoveMode::Copy),
        ];
        let ops = plan_operations(
            &fx.src_primary(),
            &fx.dst_primary(),
            &rules,
            None,
            ConflictPolicy::Rename,
        )
        .unwrap();
        apply_operations(&ops).unwrap();

        assert_eq!(fx.read_dst("new.lrc"), "lyrics");
        assert_eq!(fx.read_dst("new.cue"), "cue");
        assert!(!fx.src_dir().join("old.lrc").exists());
        assert_eq!(fx.read_src("old.cue"), "cue");
    }
}
