//! Command-line interface definitions and parsing
//!
//! This module defines the CLI of `mbsidecarctl`, the companion tool of the bulk
//! linker, using the `clap` crate.
//!
//! # Commands
//!
//! - **attach**: link or copy lyrics and cover art next to every audio file
//! - **cleanup**: remove dangling lyrics/cover symlinks
//!
//! The root directory comes before the command:
//!
//! ```text
//! mbsidecarctl -v /music attach --link-type copy --conflict rename
//! mbsidecarctl /music cleanup --no-cover
//! ```
//!
//! Options left out on the command line fall back to the `attach` section of
//! the settings file.

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

use crate::config::AttachDefaults;
use crate::links::{AttachOptions, CleanupOptions};
use crate::types::{ConflictPolicy, LinkType};

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "mbsidecarctl")]
#[command(about = "Attach and clean up lyrics/cover sidecars across a music tree", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress the summary
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Settings file to use instead of the default location
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Root directory to scan recursively
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Attach lyrics (.lrc) and cover art to audio files
    Attach {
        /// How sidecars are created [default: auto]
        #[arg(long = "link-type", value_enum, value_name = "TYPE")]
        link_type: Option<LinkType>,

        /// What to do when the sidecar name is taken [default: skip]
        #[arg(long = "conflict", value_enum, value_name = "POLICY")]
        conflict: Option<ConflictPolicy>,

        /// Do not attach lyrics
        #[arg(long = "no-lyrics")]
        no_lyrics: bool,

        /// Do not attach cover art
        #[arg(long = "no-cover")]
        no_cover: bool,

        /// Audio extension to scan (repeatable, replaces the defaults)
        #[arg(long = "audio-ext", value_name = "EXT")]
        audio_ext: Vec<String>,

        /// Cover file name to look for (repeatable, in priority order, replaces the defaults)
        #[arg(long = "cover-candidate", value_name = "NAME")]
        cover_candidate: Vec<String>,
    },

    /// Remove broken lyrics/cover symlinks
    Cleanup {
        /// Keep broken .lrc links
        #[arg(long = "no-lyrics")]
        no_lyrics: bool,

        /// Keep broken cover.jpg/cover.png links
        #[arg(long = "no-cover")]
        no_cover: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level selected by `-v` flags
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

impl Commands {
    /// Options of an `attach` run, command-line values over `defaults`
    #[must_use]
    pub fn attach_options(&self, defaults: &AttachDefaults) -> Option<AttachOptions> {
        let Self::Attach {
            link_type,
            conflict,
            no_lyrics,
            no_cover,
            audio_ext,
            cover_candidate,
        } = self
        else {
            return None;
        };

        let mut options = defaults
            .to_options()
            .link_type(link_type.unwrap_or(defaults.link_type))
            .conflict(conflict.unwrap_or(defaults.conflict))
            .lyrics(!no_lyrics)
            .cover(!no_cover);
        if !audio_ext.is_empty() {
            options = options.audio_extensions(audio_ext.iter().cloned());
        }
        if !cover_candidate.is_empty() {
            options = options.cover_candidates(cover_candidate.iter().cloned());
        }
        Some(options)
    }

    /// Options of a `cleanup` run
    #[must_use]
    pub const fn cleanup_options(&self) -> Option<CleanupOptions> {
        match self {
            Self::Cleanup {
                no_lyrics,
                no_cover,
            } => Some(CleanupOptions {
                remove_lyrics: !*no_lyrics,
                remove_cover: !*no_cover,
            }),
            Self::Attach { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attach_defaults() {
        let cli = Cli::parse_from(["mbsidecarctl", "/music", "attach"]);
        assert_eq!(cli.root, PathBuf::from("/music"));
        assert_eq!(cli.log_level(), LevelFilter::Warn);

        let options = cli.command.attach_options(&AttachDefaults::default()).unwrap();
        assert_eq!(options, AttachOptions::default());
        assert!(cli.command.cleanup_options().is_none());
    }

    #[test]
    fn test_parse_attach_flags() {
        let cli = Cli::parse_from([
            "mbsidecarctl",
            "-vv",
            "/music",
            "attach",
            "--link-type",
            "hardlink",
            "--conflict",
            "rename",
            "--no-cover",
            "--audio-ext",
            ".dsf",
            "--audio-ext",
            "flac",
            "--cover-candidate",
            "art.jpg",
        ]);
        assert_eq!(cli.log_level(), LevelFilter::Debug);

        let options = cli.command.attach_options(&AttachDefaults::default()).unwrap();
        assert_eq!(options.link_type, LinkType::Hardlink);
        assert_eq!(options.conflict, ConflictPolicy::Rename);
        assert!(options.attach_lyrics);
        assert!(!options.attach_cover);
        assert_eq!(options.audio_extensions, vec![".dsf".to_string(), "flac".to_string()]);
        assert_eq!(options.cover_candidates, vec!["art.jpg".to_string()]);
    }

    #[test]
    fn test_attach_uses_settings_defaults() {
        let defaults = AttachDefaults {
            link_type: LinkType::Copy,
            conflict: ConflictPolicy::Overwrite,
            audio_extensions: vec!["mp3".to_string()],
            cover_candidates: vec!["front.png".to_string()],
        };
        let cli = Cli::parse_from(["mbsidecarctl", "/music", "attach", "--conflict", "skip"]);

        let options = cli.command.attach_options(&defaults).unwrap();
        assert_eq!(options.link_type, LinkType::Copy);
        assert_eq!(options.conflict, ConflictPolicy::Skip);
        assert_eq!(options.audio_extensions, vec!["mp3".to_string()]);
    }

    #[test]
    fn test_parse_cleanup() {
        let cli = Cli::parse_from(["mbsidecarctl", "-q", "/music", "cleanup", "--no-lyrics"]);
        assert!(cli.quiet);
        assert_eq!(
            cli.command.cleanup_options(),
            Some(CleanupOptions {
                remove_lyrics: false,
                remove_cover: true,
            })
        );
    }

    #[test]
    fn test_global_flags_after_command() {
        let cli = Cli::parse_from(["mbsidecarctl", "/music", "cleanup", "-v", "--config", "/tmp/s.toml"]);
        assert_eq!(cli.log_level(), LevelFilter::Info);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
    }

    #[test]
    fn test_rejects_unknown_link_type() {
        let result = Cli::try_parse_from(["mbsidecarctl", "/music", "attach", "--link-type", "junction"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
