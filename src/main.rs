use std::process::ExitCode;

use log::{LevelFilter, error, info, warn};
use sidecar_handler::cli::{Cli, Commands};
use sidecar_handler::config::SidecarConfig;
use sidecar_handler::links::{attach_sidecars, cleanup_broken_links};
use sidecar_handler::output;

/// At least one item failed during the run
const EXIT_ITEM_ERRORS: u8 = 1;
/// The root directory does not exist
const EXIT_MISSING_ROOT: u8 = 2;

/// `RUST_LOG` wins over the `-v` level when set
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

/// Settings from `--config` or the default location, falling back to defaults
fn load_settings(cli: &Cli) -> SidecarConfig {
    let loaded = cli
        .config
        .as_deref()
        .map_or_else(SidecarConfig::load, SidecarConfig::load_from);
    loaded.unwrap_or_else(|e| {
        warn!("Could not load settings, using defaults: {e}");
        SidecarConfig::default()
    })
}

/// Entry point of `mbsidecarctl`
///
/// Exits with 0 on a clean run, 1 if any item failed and 2 if the root
/// directory does not exist.
fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.log_level());

    if !cli.root.exists() {
        error!("Root does not exist: {}", cli.root.display());
        return ExitCode::from(EXIT_MISSING_ROOT);
    }

    let errors = match &cli.command {
        Commands::Attach { .. } => {
            let settings = load_settings(&cli);
            let Some(options) = cli.command.attach_options(&settings.attach) else {
                return ExitCode::FAILURE;
            };
            let stats = attach_sidecars(&cli.root, &options);
            info!("Done: {}", output::attach_counters(&stats));
            if !cli.quiet {
                print!("{}", output::attach_summary(&cli.root, &stats));
            }
            stats.errors()
        }
        Commands::Cleanup { .. } => {
            let Some(options) = cli.command.cleanup_options() else {
                return ExitCode::FAILURE;
            };
            let stats = cleanup_broken_links(&cli.root, &options);
            info!("Done: {}", output::cleanup_counters(&stats));
            if !cli.quiet {
                print!("{}", output::cleanup_summary(&cli.root, &stats));
            }
            stats.errors()
        }
    };

    if errors > 0 {
        ExitCode::from(EXIT_ITEM_ERRORS)
    } else {
        ExitCode::SUCCESS
    }
}
