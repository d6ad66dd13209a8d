//! Hoist - build worker CLI
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use hoist::cli::{Cli, Commands};
use hoist::config::{ConfigManager, GeneralConfig};
use hoist::error::HoistResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging from the -v count and the [general] section:
/// 0 = warn (info when config asks for verbose), 1 = info, 2+ = debug
fn init_logging(verbose: u8, general: &GeneralConfig) {
    let level = if general.verbose { verbose.max(1) } else { verbose };
    let filter = match level {
        0 => EnvFilter::new("hoist=warn"),
        1 => EnvFilter::new("hoist=info"),
        _ => EnvFilter::new("hoist=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if general.json_logs() {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

async fn run() -> HoistResult<()> {
    let cli = Cli::parse();

    // Init and plan don't need config loading
    match cli.command {
        Commands::Init(args) => {
            init_logging(cli.verbose, &GeneralConfig::default());
            return hoist::cli::commands::init(args).await;
        }
        Commands::Plan(args) => {
            init_logging(cli.verbose, &GeneralConfig::default());
            return hoist::cli::commands::plan(args).await;
        }
        _ => {}
    }

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| hoist::error::HoistError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // Logging format and default level come from [general]
    init_logging(cli.verbose, &config.general);
    if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
    } else if let Some(ref path) = local_config_path {
        debug!("Found local config: {}", path.display());
    }

    // Dispatch to command
    match cli.command {
        Commands::Init(_) | Commands::Plan(_) => unreachable!("handled above"),
        Commands::Run(args) => hoist::cli::commands::run(args, &config).await,
        Commands::Config(args) => hoist::cli::commands::config(args, &config).await,
    }
}
