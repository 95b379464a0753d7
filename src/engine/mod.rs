//! Operation planner
//!
//! Turns a rename of one primary file plus a rule set into an ordered list of
//! [`Operation`]s. Planning only reads the filesystem (existence checks and
//! glob expansion); nothing is moved until the list reaches [`crate::fsops`].
//!
//! Ordering follows the rule set, then the lexicographic order of glob matches.
//! Every source path is resolved and must lie strictly inside the directory of
//! the source primary file; anything else is rejected as a configuration error.

pub mod operation;

pub use operation::Operation;

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::debug;

use crate::paths::{base_name, is_within, resolve_soft};
use crate::rules::types::TREE_SUFFIX;
use crate::rules::{
    ConfigError, RuleKind, SidecarRule, expand_mask, normalize_mask,
    validate_rules_for_destination,
};
use crate::types::{ConflictPolicy, MoveMode};
use crate::{Result, SidecarError};

/// Flattened tag view of the primary file, supplied by the caller
pub type Metadata = HashMap<String, String>;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Everything a single rule needs to know about the rename being planned
struct PlanContext<'a> {
    src_dir: &'a Path,
    dst_dir: &'a Path,
    src_root: PathBuf,
    src_base: String,
    dst_base: String,
    conflict: ConflictPolicy,
}

/// Plan the sidecar operations for renaming `src_primary` to `dst_primary`.
///
/// Disabled rules are skipped. Embedded rules emit nothing but, when
/// `metadata` is supplied, require their tag to be present and non-empty.
///
/// # Errors
/// Returns `SidecarError::Config` for invalid rule sets, duplicate resolved
/// filemasks, missing embedded tags, unparsable masks and paths escaping the
/// source directory. Returns `SidecarError::Io` when a directory cannot be read
/// during resolution or glob expansion.
pub fn plan_operations(
    src_primary: &Path,
    dst_primary: &Path,
    rules: &[SidecarRule],
    metadata: Option<&Metadata>,
    conflict: ConflictPolicy,
) -> Result<Vec<Operation>> {
    let src_dir = parent_dir(src_primary);
    let dst_dir = parent_dir(dst_primary);
    let dst_base = base_name(dst_primary);

    validate_rules_for_destination(rules, &dst_base)?;

    let ctx = PlanContext {
        src_dir,
        dst_dir,
        src_root: resolve_soft(src_dir)?,
        src_base: base_name(src_primary),
        dst_base,
        conflict,
    };

    let mut ops = Vec::new();
    for rule in rules.iter().filter(|r| r.enabled) {
        match &rule.kind {
            RuleKind::Embedded { tag } => {
                check_embedded_tag(tag, metadata)?;
                debug!("Embedded sidecar handled by metadata: {}", rule.type_label);
            }
            RuleKind::External { filemask } => {
                let mask = normalize_mask(filemask);
                if let Some(dir_template) = mask.strip_suffix(TREE_SUFFIX) {
                    plan_tree(&ctx, dir_template, rule.move_mode, &mut ops)?;
                } else {
                    plan_files(&ctx, &mask, rule.move_mode, &mut ops)?;
                }
            }
        }
    }
    Ok(ops)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn check_embedded_tag(tag: &str, metadata: Option<&Metadata>) -> Result<()> {
    let Some(metadata) = metadata else {
        return Ok(());
    };
    if metadata.get(tag).is_none_or(|value| value.is_empty()) {
        return Err(ConfigError::EmbeddedTagMissing { tag: tag.to_string() }.into());
    }
    Ok(())
}

/// Resolve `candidate` and insist it sits strictly below the source root.
fn resolve_inside(candidate: &Path, root: &Path) -> Result<PathBuf> {
    let resolved = resolve_soft(candidate)?;
    if resolved == root || !is_within(&resolved, root) {
        return Err(ConfigError::PathEscape { path: resolved }.into());
    }
    Ok(resolved)
}

fn plan_tree(
    ctx: &PlanContext<'_>,
    dir_template: &str,
    mode: MoveMode,
    ops: &mut Vec<Operation>,
) -> Result<()> {
    let src_name = expand_mask(dir_template, &ctx.src_base);
    let dst_name = expand_mask(dir_template, &ctx.dst_base);

    let src_dir = resolve_inside(&ctx.src_dir.join(&src_name), &ctx.src_root)?;
    if !src_dir.is_dir() {
        debug!("No sidecar tree at {}", src_dir.display());
        return Ok(());
    }

    ops.push(Operation::Tree {
        src_dir,
        dst_dir: ctx.dst_dir.join(dst_name),
        mode,
        conflict: ctx.conflict,
    });
    Ok(())
}

fn plan_files(
    ctx: &PlanContext<'_>,
    mask: &str,
    mode: MoveMode,
    ops: &mut Vec<Operation>,
) -> Result<()> {
    // Literal parts of the pattern are escaped so brackets in album or track
    // names are not read as character classes.
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&ctx.src_dir.to_string_lossy()),
        expand_mask(mask, &Pattern::escape(&ctx.src_base))
    );
    let entries = glob::glob_with(&pattern, GLOB_OPTIONS).map_err(|e| {
        SidecarError::from(ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })
    })?;

    let mut matches = BTreeSet::new();
    for entry in entries {
        matches.insert(entry.map_err(glob::GlobError::into_error)?);
    }

    for found in matches {
        let src = resolve_inside(&found, &ctx.src_root)?;
        let Ok(rel) = src.strip_prefix(&ctx.src_root) else {
            return Err(ConfigError::PathEscape { path: src }.into());
        };
        let dst = destination_for(ctx, rel);

        if src.is_dir() {
            ops.push(Operation::Tree {
                src_dir: src,
                dst_dir: dst,
                mode,
                conflict: ctx.conflict,
            });
        } else {
            ops.push(Operation::File {
                src,
                dst,
                mode,
                conflict: ctx.conflict,
            });
        }
    }
    Ok(())
}

/// Same relative location under the destination directory, with the source
/// base name replaced by the destination base name in the file name.
fn destination_for(ctx: &PlanContext<'_>, rel: &Path) -> PathBuf {
    let name = rel
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let renamed = if ctx.src_base.is_empty() {
        name
    } else {
        name.replace(&ctx.src_base, &ctx.dst_base)
    };
    let parent = match rel.parent() {
        Some(p) if !p.as_os_str().is_empty() => ctx.dst_dir.join(p),
        _ => ctx.dst_dir.to_path_buf(),
    };
    parent.join(renamed)
}
