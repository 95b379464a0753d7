//! Bulk sidecar linker
//!
//! Scans a music tree and attaches sidecars to audio files without a rename
//! event to drive it:
//!
//! - **Lyrics**: every audio file gets a same-stem `.lrc` next to it, taken from
//!   the same directory if present, otherwise from the single `.lrc` anywhere
//!   under the root whose stem matches (case-insensitively). Zero or several
//!   matches are ambiguous and skipped silently.
//! - **Covers**: every directory holding audio gets a `cover.<ext>` built from
//!   the first existing candidate name (e.g. `folder.jpg`).
//!
//! Sidecars are created as symlinks, hardlinks or copies; [`LinkType::Auto`]
//! falls back from one to the next on OS-level failures. A cleanup pass
//! removes dangling lyrics/cover symlinks.
//!
//! Per-item failures are logged and counted, never fatal to the scan. Like the
//! executor, the linker assumes it is the only writer in the tree.

pub mod stats;

pub use stats::{AttachStats, CleanupStats};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use walkdir::WalkDir;

use crate::fsops::{self, FsError, copy_file, ensure_parent, resolve_conflict};
use crate::paths::{is_broken_symlink, is_occupied, resolve_soft};
use crate::types::{ConflictPolicy, LinkType};
use stats::{AttachTally, CleanupTally};

/// Audio extensions scanned by default
pub const AUDIO_EXTS_DEFAULT: &[&str] = &[
    ".flac", ".mp3", ".m4a", ".ogg", ".opus", ".wav", ".aiff", ".ape", ".wv",
];

/// Cover file names looked up in each directory, in priority order
pub const COVER_CANDIDATES_DEFAULT: &[&str] = &[
    "cover.jpg",
    "cover.png",
    "folder.jpg",
    "folder.png",
    "front.jpg",
    "front.png",
];

const LYRICS_EXT: &str = "lrc";

/// Settings of an attach run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachOptions {
    pub link_type: LinkType,
    pub conflict: ConflictPolicy,
    /// Extensions with or without the leading dot, compared case-insensitively
    pub audio_extensions: Vec<String>,
    /// File names compared case-sensitively, first existing one wins
    pub cover_candidates: Vec<String>,
    pub attach_lyrics: bool,
    pub attach_cover: bool,
}

impl Default for AttachOptions {
    fn default() -> Self {
        Self {
            link_type: LinkType::Auto,
            conflict: ConflictPolicy::Skip,
            audio_extensions: AUDIO_EXTS_DEFAULT.iter().map(ToString::to_string).collect(),
            cover_candidates: COVER_CANDIDATES_DEFAULT.iter().map(ToString::to_string).collect(),
            attach_lyrics: true,
            attach_cover: true,
        }
    }
}

impl AttachOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub const fn link_type(mut self, v: LinkType) -> Self {
        self.link_type = v;
        self
    }
    #[must_use]
    pub const fn conflict(mut self, v: ConflictPolicy) -> Self {
        self.conflict = v;
        self
    }
    #[must_use]
    pub const fn lyrics(mut self, v: bool) -> Self {
        self.attach_lyrics = v;
        self
    }
    #[must_use]
    pub const fn cover(mut self, v: bool) -> Self {
        self.attach_cover = v;
        self
    }
    #[must_use]
    pub fn audio_extensions<S: Into<String>>(mut self, exts: impl IntoIterator<Item = S>) -> Self {
        self.audio_extensions = exts.into_iter().map(Into::into).collect();
        self
    }
    #[must_use]
    pub fn cover_candidates<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.cover_candidates = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Settings of a cleanup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Remove dangling `*.lrc` links
    pub remove_lyrics: bool,
    /// Remove dangling `cover.jpg` / `cover.png` links
    pub remove_cover: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            remove_lyrics: true,
            remove_cover: true,
        }
    }
}

/// Result of attaching one sidecar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attached {
    Created,
    Skipped,
    Unchanged,
}

/// Attach lyrics and/or covers to every audio file under `root`.
#[must_use]
pub fn attach_sidecars(root: &Path, options: &AttachOptions) -> AttachStats {
    let mut tally = AttachTally::default();
    let extensions: HashSet<String> = options
        .audio_extensions
        .iter()
        .map(|e| normalize_extension(e))
        .collect();

    let lyrics_index = if options.attach_lyrics {
        index_lyrics(root)
    } else {
        HashMap::new()
    };
    let mut cover_done: HashSet<PathBuf> = HashSet::new();

    for audio in audio_files(root, &extensions, &mut tally) {
        tally.add_audio();

        if options.attach_lyrics {
            match attach_lyrics(&audio, &lyrics_index, options) {
                Ok(Attached::Created) => tally.add_lyrics(),
                Ok(Attached::Skipped) => tally.add_skip(),
                Ok(Attached::Unchanged) => {}
                Err(e) => {
                    tally.add_error();
                    error!("Failed attaching lyrics for {}: {e}", audio.display());
                }
            }
        }

        if options.attach_cover {
            let Some(folder) = audio.parent() else {
                continue;
            };
            if !cover_done.insert(folder.to_path_buf()) {
                continue;
            }
            match attach_cover(folder, options) {
                Ok(Attached::Created) => tally.add_cover(),
                Ok(Attached::Skipped) => tally.add_skip(),
                Ok(Attached::Unchanged) => {}
                Err(e) => {
                    tally.add_error();
                    error!("Failed attaching cover in {}: {e}", folder.display());
                }
            }
        }
    }

    tally.finish()
}

/// Remove dangling lyrics/cover symlinks under `root`.
///
/// Only symlinks are inspected. Dangling links with other names are counted
/// as skipped and left in place.
#[must_use]
pub fn cleanup_broken_links(root: &Path, options: &CleanupOptions) -> CleanupStats {
    let mut tally = CleanupTally::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tally.add_error();
                error!("Failed walking {}: {e}", root.display());
                continue;
            }
        };
        if !entry.path_is_symlink() {
            continue;
        }
        let path = entry.path();

        match is_broken_symlink(path) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                tally.add_error();
                error!("Failed inspecting link {}: {e}", path.display());
                continue;
            }
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        let is_lyrics = options.remove_lyrics && name.ends_with(".lrc");
        let is_cover = options.remove_cover && (name == "cover.jpg" || name == "cover.png");
        if !(is_lyrics || is_cover) {
            debug!("Leaving unrelated broken link: {}", path.display());
            tally.add_skip();
            continue;
        }

        match fs::remove_file(path) {
            Ok(()) => {
                tally.add_removed();
                info!("Removed broken sidecar link: {}", path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => tally.add_removed(),
            Err(e) => {
                tally.add_error();
                error!("Failed removing broken link {}: {e}", path.display());
            }
        }
    }

    tally.finish()
}

/// Create `dst` as a link to (or copy of) `target`.
///
/// The conflict at `dst` is resolved once, up front; a dangling symlink there
/// counts as taken. Returns the path created, or `None` if the policy skipped.
///
/// With [`LinkType::Auto`], a symlink is tried first and kept only if it
/// resolves; then a hardlink; then a plain copy.
///
/// # Errors
/// Returns `FsError` if conflict resolution or the requested link/copy fails.
pub fn create_link_or_copy(
    dst: &Path,
    target: &Path,
    link_type: LinkType,
    conflict: ConflictPolicy,
) -> fsops::Result<Option<PathBuf>> {
    let target = match fs::canonicalize(target) {
        Ok(resolved) => resolved,
        Err(_) => resolve_soft(target)?,
    };

    let Some(dst) = resolve_conflict(dst, conflict)? else {
        return Ok(None);
    };
    ensure_parent(&dst)?;
    if is_occupied(&dst) {
        return Err(FsError::DestinationNotFree { path: dst });
    }

    match link_type {
        LinkType::Symlink => symlink_file(&target, &dst)?,
        LinkType::Hardlink => fs::hard_link(&target, &dst)?,
        LinkType::Copy => copy_file(&target, &dst)?,
        LinkType::Auto => link_with_fallback(&target, &dst)?,
    }
    Ok(Some(dst))
}

fn link_with_fallback(target: &Path, dst: &Path) -> io::Result<()> {
    match symlink_file(target, dst) {
        Ok(()) if fs::metadata(dst).is_ok() => return Ok(()),
        Ok(()) => {
            debug!("Symlink {} does not resolve; trying hardlink/copy", dst.display());
            fs::remove_file(dst)?;
        }
        Err(e) => debug!("Symlink failed ({e}); trying hardlink/copy"),
    }

    match fs::hard_link(target, dst) {
        Ok(()) => return Ok(()),
        Err(e) => debug!("Hardlink failed ({e}); falling back to copy"),
    }

    copy_file(target, dst)
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink_file(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

fn audio_files(root: &Path, extensions: &HashSet<String>, tally: &mut AttachTally) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tally.add_error();
                error!("Failed walking {}: {e}", root.display());
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && lowercase_extension(path).is_some_and(|ext| extensions.contains(&ext)) {
            files.push(entry.into_path());
        }
    }
    files
}

/// Lowercase file stem → every `.lrc` file under `root` with that stem
fn index_lyrics(root: &Path) -> HashMap<String, Vec<PathBuf>> {
    let mut index: HashMap<String, Vec<PathBuf>> = HashMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry while indexing lyrics: {e}");
                continue;
            }
        };
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != LYRICS_EXT) || !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        index
            .entry(stem.to_string_lossy().to_lowercase())
            .or_default()
            .push(entry.into_path());
    }
    index
}

fn find_lyrics(audio: &Path, index: &HashMap<String, Vec<PathBuf>>) -> Option<PathBuf> {
    let local = audio.with_extension(LYRICS_EXT);
    if local.exists() {
        return Some(local);
    }
    let stem = audio.file_stem()?.to_string_lossy().to_lowercase();
    match index.get(&stem).map(Vec::as_slice) {
        Some([only]) => Some(only.clone()),
        _ => None,
    }
}

fn find_cover(folder: &Path, candidates: &[String]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| folder.join(name))
        .find(|path| path.is_file())
}

fn attach_lyrics(
    audio: &Path,
    index: &HashMap<String, Vec<PathBuf>>,
    options: &AttachOptions,
) -> fsops::Result<Attached> {
    let Some(src) = find_lyrics(audio, index) else {
        debug!("No lyrics for {}", audio.display());
        return Ok(Attached::Unchanged);
    };
    let dst = audio.with_extension(LYRICS_EXT);
    attach_one(&dst, &src, options, "lyrics")
}

fn attach_cover(folder: &Path, options: &AttachOptions) -> fsops::Result<Attached> {
    let Some(src) = find_cover(folder, &options.cover_candidates) else {
        debug!("No cover candidates in {}", folder.display());
        return Ok(Attached::Unchanged);
    };
    let name = lowercase_extension(&src).map_or_else(|| "cover".to_string(), |ext| format!("cover.{ext}"));
    attach_one(&folder.join(name), &src, options, "cover")
}

fn attach_one(dst: &Path, src: &Path, options: &AttachOptions, what: &str) -> fsops::Result<Attached> {
    if resolve_soft(dst)? == resolve_soft(src)? {
        debug!("{what} already attached: {}", dst.display());
        return Ok(Attached::Unchanged);
    }
    match create_link_or_copy(dst, src, options.link_type, options.conflict)? {
        Some(created) => {
            info!("Attached {what}: {} -> {}", created.display(), src.display());
            Ok(Attached::Created)
        }
        None => Ok(Attached::Skipped),
    }
}
