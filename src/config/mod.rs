//! Configuration module for sidecar-handler
//!
//! Persists the sidecar rule set, the legacy-overlap flags used by the host
//! hook, and the defaults of the bulk linker. Settings are stored as TOML in
//! the user's config directory.

use std::fs;
use std::path::{Path, PathBuf};

use ::config::{Config, ConfigError, File, FileFormat};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::links::{AUDIO_EXTS_DEFAULT, AttachOptions, COVER_CANDIDATES_DEFAULT};
use crate::rules::{SidecarRule, coerce_rules, default_rules, rules_to_json};
use crate::types::{ConflictPolicy, LinkType};

/// Defaults for `attach` runs of the bulk linker
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AttachDefaults {
    pub link_type: LinkType,
    pub conflict: ConflictPolicy,
    pub audio_extensions: Vec<String>,
    pub cover_candidates: Vec<String>,
}

impl Default for AttachDefaults {
    fn default() -> Self {
        Self {
            link_type: LinkType::Auto,
            conflict: ConflictPolicy::Skip,
            audio_extensions: AUDIO_EXTS_DEFAULT.iter().map(ToString::to_string).collect(),
            cover_candidates: COVER_CANDIDATES_DEFAULT.iter().map(ToString::to_string).collect(),
        }
    }
}

impl AttachDefaults {
    /// Attach options seeded from these defaults, lyrics and covers enabled
    #[must_use]
    pub fn to_options(&self) -> AttachOptions {
        AttachOptions::new()
            .link_type(self.link_type)
            .conflict(self.conflict)
            .audio_extensions(self.audio_extensions.iter().cloned())
            .cover_candidates(self.cover_candidates.iter().cloned())
    }
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SidecarConfig {
    /// Rule set in its stored JSON form
    #[serde(default = "default_rules_json")]
    pub rules_json: String,

    /// Sidecar rules take over from the host's own "move additional files"
    #[serde(default)]
    pub supersede_additional_files: bool,

    /// The overlap warning has already been shown once
    #[serde(default)]
    pub warned_about_additional_files: bool,

    #[serde(default)]
    pub attach: AttachDefaults,
}

fn default_rules_json() -> String {
    // An empty string falls back to the defaults again in `rules()`
    rules_to_json(&default_rules()).unwrap_or_default()
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            rules_json: default_rules_json(),
            supersede_additional_files: false,
            warned_about_additional_files: false,
            attach: AttachDefaults::default(),
        }
    }
}

impl SidecarConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("sidecar-handler").join("config.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config path cannot be determined or writing fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the parent directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// The stored rule set, or the built-in defaults if it does not parse
    #[must_use]
    pub fn rules(&self) -> Vec<SidecarRule> {
        coerce_rules(Some(self.rules_json.as_str())).unwrap_or_else(|e| {
            warn!("Invalid stored sidecar rules, using defaults: {e}");
            default_rules()
        })
    }

    /// Replace the stored rule set after validating it
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` (the rule kind) if the rules are invalid.
    pub fn set_rules(&mut self, rules: &[SidecarRule]) -> crate::rules::Result<()> {
        crate::rules::validate_rule_set(rules)?;
        self.rules_json = rules_to_json(rules)?;
        Ok(())
    }
}
