//! Host hook adapter
//!
//! Glue for host applications that report a save in two phases: once before
//! the primary file is renamed or moved and once after. The caller keeps the
//! [`SaveRequest`] captured in the first phase and hands it back in the
//! second; nothing is remembered across calls here.
//!
//! The hook is the outermost error boundary. Rule problems and filesystem
//! failures are logged and reported as a [`HookOutcome`], never propagated
//! into the host's own save pipeline.

use std::path::{Path, PathBuf};

use log::{debug, error, warn};

use crate::config::SidecarConfig;
use crate::engine::{Metadata, plan_operations};
use crate::fsops::apply_operations;
use crate::types::ConflictPolicy;
use crate::Result;

/// Host saves do not expose their own per-file conflict decision
const HOOK_CONFLICT_POLICY: ConflictPolicy = ConflictPolicy::Rename;

/// Path of a primary file captured before the host saves it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    original: PathBuf,
}

impl SaveRequest {
    #[must_use]
    pub fn capture(path: impl Into<PathBuf>) -> Self {
        Self {
            original: path.into(),
        }
    }

    #[must_use]
    pub fn original_path(&self) -> &Path {
        &self.original
    }
}

/// The host's own "move additional files" settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFileSettings {
    pub move_additional_files: bool,
    pub additional_files_pattern: String,
}

/// What a post-save call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// The primary file did not move
    Unchanged,
    /// Every planned operation was applied (or skipped by the conflict policy)
    Applied { operations: usize },
    /// Rules were invalid for this file; nothing was touched
    ConfigFailed,
    /// A filesystem operation failed; earlier operations stay applied
    IoFailed,
}

/// Moves sidecars along with primary files saved by a host application
#[derive(Debug, Clone, Default)]
pub struct SidecarHook {
    settings: SidecarConfig,
}

impl SidecarHook {
    #[must_use]
    pub const fn new(settings: SidecarConfig) -> Self {
        Self { settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &SidecarConfig {
        &self.settings
    }

    /// Settings, including the warned flag, for the caller to persist
    #[must_use]
    pub fn into_settings(self) -> SidecarConfig {
        self.settings
    }

    /// Plan and apply sidecar operations for a saved primary file.
    ///
    /// Without a captured request the file is assumed not to have moved.
    pub fn after_save(
        &self,
        request: Option<SaveRequest>,
        new_path: &Path,
        metadata: Option<&Metadata>,
    ) -> HookOutcome {
        let src = request.map_or_else(|| new_path.to_path_buf(), |r| r.original);
        if src.as_path() == new_path {
            debug!("Primary file did not move: {}", new_path.display());
            return HookOutcome::Unchanged;
        }

        match self.sync_sidecars(&src, new_path, metadata) {
            Ok(operations) => HookOutcome::Applied { operations },
            Err(e) if e.is_config() => {
                error!("Sidecar configuration error for {}: {e}", new_path.display());
                HookOutcome::ConfigFailed
            }
            Err(e) => {
                error!(
                    "Sidecar processing failed for {} -> {}: {e}",
                    src.display(),
                    new_path.display()
                );
                HookOutcome::IoFailed
            }
        }
    }

    fn sync_sidecars(&self, src: &Path, dst: &Path, metadata: Option<&Metadata>) -> Result<usize> {
        let rules = self.settings.rules();
        let ops = plan_operations(src, dst, &rules, metadata, HOOK_CONFLICT_POLICY)?;
        apply_operations(&ops)?;
        Ok(ops.len())
    }

    /// Warn once when the host would move the same files as the sidecar rules.
    ///
    /// Returns true if the warning was issued by this call. The warned flag is
    /// set in the settings; persisting it is up to the caller.
    pub fn check_legacy_overlap(&mut self, host: &HostFileSettings) -> bool {
        if !self.settings.supersede_additional_files
            || self.settings.warned_about_additional_files
            || !host.move_additional_files
            || host.additional_files_pattern.trim().is_empty()
        {
            return false;
        }
        warn!(
            "The host's 'Move additional files' option is enabled; disable it to avoid \
             double-moving sidecars."
        );
        self.settings.warned_about_additional_files = true;
        true
    }
}
