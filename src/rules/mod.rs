//! Sidecar rule model
//!
//! A rule describes one category of sidecar that travels with a primary media
//! file. Rules come in two shapes:
//!
//! - **External**: a `filemask` template containing `{base}` (the primary file
//!   name without extension), e.g. `{base}.lrc`. A mask ending in `/**` names a
//!   whole directory of extras (a *tree rule*).
//! - **Embedded**: the data lives in the primary file's own metadata under a tag,
//!   so there is nothing on disk to move.
//!
//! Rule sets are stored as a compact JSON array with a stable key order and are
//! re-validated every time they are loaded.
//!
//! # Examples
//!
//! ```
//! use sidecar_handler::rules::{default_rules, rules_from_json, rules_to_json};
//!
//! let rules = default_rules();
//! let stored = rules_to_json(&rules)?;
//! assert_eq!(rules_from_json(&stored)?, rules);
//! # Ok::<(), sidecar_handler::rules::ConfigError>(())
//! ```

pub mod error;
pub mod types;

pub use error::{ConfigError, Result};
pub use types::{RuleKind, SidecarRule, expand_mask, normalize_mask};

use std::collections::{HashMap, HashSet};

use types::RuleRecord;

/// Built-in rule set used when nothing valid is stored
#[must_use]
pub fn default_rules() -> Vec<SidecarRule> {
    vec![
        SidecarRule::external("lyrics", "{base}.lrc"),
        SidecarRule::external("cue", "{base}.cue"),
        SidecarRule::external("nfo", "{base}.nfo"),
        SidecarRule::external("xml", "{base}.xml"),
        SidecarRule::external("log", "{base}.log"),
        SidecarRule::external("m3u", "{base}.m3u"),
        SidecarRule::external("booklet", "{base}.pdf"),
        SidecarRule::external("checksums_sfv", "{base}.sfv"),
        SidecarRule::external("checksums_md5", "{base}.md5").with_enabled(false),
        SidecarRule::embedded("cover_embedded", "coverart").with_enabled(false),
    ]
}

/// Check the per-field invariants of a single rule.
///
/// # Errors
/// Returns the `ConfigError` naming the first violated constraint.
pub fn validate_rule(rule: &SidecarRule) -> Result<()> {
    if rule.type_label.trim().is_empty() {
        return Err(ConfigError::MissingLabel);
    }
    match &rule.kind {
        RuleKind::Embedded { tag } => {
            if tag.trim().is_empty() {
                return Err(ConfigError::MissingEmbeddedTag(rule.type_label.clone()));
            }
        }
        RuleKind::External { filemask } => {
            if filemask.trim().is_empty() {
                return Err(ConfigError::MissingFilemask(rule.type_label.clone()));
            }
            if !filemask.contains(types::BASE_PLACEHOLDER) {
                return Err(ConfigError::MissingBasePlaceholder(rule.type_label.clone()));
            }
        }
    }
    Ok(())
}

/// Check a whole rule set: non-empty, every rule valid, and no two enabled
/// external rules sharing a normalized filemask template.
///
/// # Errors
/// Returns `ConfigError::EmptyRuleSet`, the first per-rule error, or
/// `ConfigError::DuplicateFilemask` identifying the repeated template.
pub fn validate_rule_set(rules: &[SidecarRule]) -> Result<()> {
    if rules.is_empty() {
        return Err(ConfigError::EmptyRuleSet);
    }
    let mut seen: HashSet<String> = HashSet::new();
    for rule in rules {
        validate_rule(rule)?;
        if !rule.enabled {
            continue;
        }
        if let Some(mask) = rule.normalized_mask()
            && !seen.insert(mask.clone())
        {
            return Err(ConfigError::DuplicateFilemask { mask });
        }
    }
    Ok(())
}

/// Validate `rules` for one concrete primary file.
///
/// On top of [`validate_rule_set`], the filemasks of enabled external rules are
/// expanded with `dst_base` and must still be pairwise distinct, since two
/// different templates can collapse to the same literal name.
///
/// # Errors
/// Returns any error of [`validate_rule_set`], or
/// `ConfigError::DuplicateResolvedMask` naming both colliding rules.
pub fn validate_rules_for_destination(rules: &[SidecarRule], dst_base: &str) -> Result<()> {
    validate_rule_set(rules)?;

    let mut seen: HashMap<String, &str> = HashMap::new();
    for rule in rules.iter().filter(|r| r.enabled) {
        let Some(mask) = rule.normalized_mask() else {
            continue;
        };
        let expanded = expand_mask(&mask, dst_base);
        if let Some(first) = seen.get(expanded.as_str()) {
            return Err(ConfigError::DuplicateResolvedMask {
                mask: expanded,
                first: (*first).to_string(),
                second: rule.type_label.clone(),
            });
        }
        seen.insert(expanded, &rule.type_label);
    }
    Ok(())
}

/// Serialize a rule set to its compact storage form.
///
/// # Errors
/// Returns `ConfigError::InvalidJson` if serialization fails.
pub fn rules_to_json(rules: &[SidecarRule]) -> Result<String> {
    let records: Vec<RuleRecord> = rules.iter().map(RuleRecord::from).collect();
    serde_json::to_string(&records).map_err(|e| ConfigError::InvalidJson(e.to_string()))
}

/// Parse and validate a stored rule set.
///
/// Missing keys fall back to their defaults (`enabled` true, `move_mode` move,
/// everything else empty/false) before validation.
///
/// # Errors
/// Returns `ConfigError::InvalidJson` for unparsable input or mistyped fields,
/// `ConfigError::NotAList` / `ConfigError::NotAnObject` for the wrong shape, and
/// any validation error of [`validate_rule_set`].
pub fn rules_from_json(raw: &str) -> Result<Vec<SidecarRule>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
    let serde_json::Value::Array(items) = value else {
        return Err(ConfigError::NotAList);
    };

    let mut rules = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            return Err(ConfigError::NotAnObject);
        }
        let record: RuleRecord =
            serde_json::from_value(item).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        rules.push(SidecarRule::try_from(record)?);
    }

    validate_rule_set(&rules)?;
    Ok(rules)
}

/// Rules from an optional stored value; `None` means the built-in defaults.
///
/// # Errors
/// Returns any error of [`rules_from_json`].
pub fn coerce_rules(stored: Option<&str>) -> Result<Vec<SidecarRule>> {
    stored.map_or_else(|| Ok(default_rules()), rules_from_json)
}
