use serde::{Deserialize, Serialize};

use super::error::{ConfigError, Result};
use crate::types::MoveMode;

/// Placeholder substituted with the primary file name (without extension)
pub const BASE_PLACEHOLDER: &str = "{base}";

/// Suffix marking a filemask as a whole directory of extras
pub const TREE_SUFFIX: &str = "/**";

/// Where the sidecar data of a rule lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Data lives inside the primary file's own metadata under `tag`
    Embedded { tag: String },
    /// Data is a separate file (or a directory tree when the mask ends in `/**`)
    External { filemask: String },
}

/// One category of sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarRule {
    pub type_label: String,
    pub enabled: bool,
    pub move_mode: MoveMode,
    pub kind: RuleKind,
}

impl SidecarRule {
    /// Enabled external rule matching `filemask`, moved by default.
    pub fn external(type_label: impl Into<String>, filemask: impl Into<String>) -> Self {
        Self {
            type_label: type_label.into(),
            enabled: true,
            move_mode: MoveMode::Move,
            kind: RuleKind::External {
                filemask: filemask.into(),
            },
        }
    }

    /// Enabled embedded rule checking the metadata field `tag`.
    pub fn embedded(type_label: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            type_label: type_label.into(),
            enabled: true,
            move_mode: MoveMode::Move,
            kind: RuleKind::Embedded { tag: tag.into() },
        }
    }

    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: MoveMode) -> Self {
        self.move_mode = mode;
        self
    }

    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self.kind, RuleKind::Embedded { .. })
    }

    /// Filemask with backslashes turned into forward slashes, for external rules
    #[must_use]
    pub fn normalized_mask(&self) -> Option<String> {
        match &self.kind {
            RuleKind::External { filemask } => Some(normalize_mask(filemask)),
            RuleKind::Embedded { .. } => None,
        }
    }

    /// True when the rule designates a whole directory of extras
    #[must_use]
    pub fn is_tree(&self) -> bool {
        self.normalized_mask()
            .is_some_and(|mask| mask.ends_with(TREE_SUFFIX))
    }
}

#[must_use]
pub fn normalize_mask(mask: &str) -> String {
    mask.replace('\\', "/")
}

#[must_use]
pub fn expand_mask(mask: &str, base: &str) -> String {
    mask.replace(BASE_PLACEHOLDER, base)
}

/// Flat storage shape of a rule.
///
/// Fields are declared in alphabetical order so the serialized key order is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RuleRecord {
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub embedded_tag: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub filemask: String,
    #[serde(default)]
    pub move_mode: MoveMode,
    #[serde(default)]
    pub type_label: String,
}

const fn default_enabled() -> bool {
    true
}

impl From<&SidecarRule> for RuleRecord {
    fn from(rule: &SidecarRule) -> Self {
        let (embedded, embedded_tag, filemask) = match &rule.kind {
            RuleKind::Embedded { tag } => (true, tag.clone(), String::new()),
            RuleKind::External { filemask } => (false, String::new(), filemask.clone()),
        };
        Self {
            embedded,
            embedded_tag,
            enabled: rule.enabled,
            filemask,
            move_mode: rule.move_mode,
            type_label: rule.type_label.clone(),
        }
    }
}

impl TryFrom<RuleRecord> for SidecarRule {
    type Error = ConfigError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        let label = record.type_label;
        let kind = if record.embedded {
            if !record.filemask.trim().is_empty() {
                return Err(ConfigError::EmbeddedWithFilemask(label));
            }
            RuleKind::Embedded {
                tag: record.embedded_tag,
            }
        } else {
            if !record.embedded_tag.trim().is_empty() {
                return Err(ConfigError::ExternalWithTag(label));
            }
            RuleKind::External {
                filemask: record.filemask,
            }
        };
        let rule = Self {
            type_label: label,
            enabled: record.enabled,
            move_mode: record.move_mode,
            kind,
        };
        super::validate_rule(&rule)?;
        Ok(rule)
    }
}
