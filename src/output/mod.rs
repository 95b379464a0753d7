//! Output formatting for CLI display
//!
//! Colored end-of-run summaries for the bulk linker commands, plus the plain
//! one-line form that goes to the log.

use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;

use crate::links::{AttachStats, CleanupStats};

/// Multi-line colored summary of an attach run
#[must_use]
pub fn attach_summary(root: &Path, stats: &AttachStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Attach Summary ===".bold());
    let _ = writeln!(out, "  {} {}", "Root:".bold(), root.display());
    let _ = writeln!(out, "  {} {}", "♪ Audio files:".cyan(), stats.processed_audio());
    let _ = writeln!(out, "  {} {}", "✓ Lyrics attached:".green(), stats.created_lyrics());
    let _ = writeln!(out, "  {} {}", "✓ Covers attached:".green(), stats.created_covers());
    if stats.skipped() > 0 {
        let _ = writeln!(out, "  {} {}", "⊘ Skipped:".yellow(), stats.skipped());
    }
    if stats.errors() > 0 {
        let _ = writeln!(out, "  {} {}", "✗ Errors:".red(), stats.errors());
    }
    out
}

/// Multi-line colored summary of a cleanup run
#[must_use]
pub fn cleanup_summary(root: &Path, stats: &CleanupStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Cleanup Summary ===".bold());
    let _ = writeln!(out, "  {} {}", "Root:".bold(), root.display());
    let _ = writeln!(out, "  {} {}", "✓ Broken links removed:".green(), stats.removed_broken_links());
    if stats.skipped() > 0 {
        let _ = writeln!(out, "  {} {}", "⊘ Skipped:".yellow(), stats.skipped());
    }
    if stats.errors() > 0 {
        let _ = writeln!(out, "  {} {}", "✗ Errors:".red(), stats.errors());
    }
    out
}

/// `key=value` form of attach counters
#[must_use]
pub fn attach_counters(stats: &AttachStats) -> String {
    format!(
        "processed_audio={} created_lyrics={} created_covers={} skipped={} errors={}",
        stats.processed_audio(),
        stats.created_lyrics(),
        stats.created_covers(),
        stats.skipped(),
        stats.errors()
    )
}

/// `key=value` form of cleanup counters
#[must_use]
pub fn cleanup_counters(stats: &CleanupStats) -> String {
    format!(
        "removed_broken_links={} skipped={} errors={}",
        stats.removed_broken_links(),
        stats.skipped(),
        stats.errors()
    )
}
