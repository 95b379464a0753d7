use std::path::PathBuf;
use thiserror::Error;

/// Invalid or self-contradictory sidecar rule definitions.
///
/// Raised synchronously while validating a rule set or planning operations; a
/// plan that fails with one of these never touches the filesystem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Rule has an empty `type_label`
    #[error("type_label is required")]
    MissingLabel,

    /// Embedded rule without a tag name
    #[error("embedded_tag is required when embedded=true (rule '{0}')")]
    MissingEmbeddedTag(String),

    /// Embedded rule that also carries a filemask
    #[error("filemask must be empty when embedded=true (rule '{0}')")]
    EmbeddedWithFilemask(String),

    /// External rule without a filemask
    #[error("filemask is required when embedded=false (rule '{0}')")]
    MissingFilemask(String),

    /// External rule whose filemask lacks the `{base}` placeholder
    #[error("filemask must include '{{base}}' (rule '{0}')")]
    MissingBasePlaceholder(String),

    /// External rule that also carries an embedded tag
    #[error("embedded_tag must be empty when embedded=false (rule '{0}')")]
    ExternalWithTag(String),

    /// Rule set without any rule
    #[error("At least one rule is required")]
    EmptyRuleSet,

    /// Two enabled external rules share a filemask template
    #[error("Duplicate filemask template for enabled external rule: '{mask}'")]
    DuplicateFilemask { mask: String },

    /// Two enabled external rules expand to the same filemask for one primary file
    #[error("Duplicate resolved filemask for this file: '{mask}' (rules: '{first}' and '{second}')")]
    DuplicateResolvedMask {
        mask: String,
        first: String,
        second: String,
    },

    /// Embedded rule whose tag is absent or empty in the supplied metadata
    #[error("Embedded tag missing or empty: {tag}")]
    EmbeddedTagMissing { tag: String },

    /// A resolved sidecar path lies outside the primary file's directory
    #[error("Sidecar path escapes source directory: {}", path.display())]
    PathEscape { path: PathBuf },

    /// A filemask could not be turned into a glob pattern
    #[error("Invalid filemask pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Stored rules are not valid JSON
    #[error("Invalid rules JSON: {0}")]
    InvalidJson(String),

    /// Stored rules are valid JSON but not an array
    #[error("Rules JSON must be a list")]
    NotAList,

    /// An entry of the stored rules array is not an object
    #[error("Each rule must be an object")]
    NotAnObject,
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, ConfigError>;
