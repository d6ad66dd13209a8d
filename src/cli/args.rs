//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Hoist - build-event relay and target invocation worker
///
/// Invokes named targets against a project context, batching them per
/// execution mode, caching batch results, and forwarding build events
/// to an aggregator.
#[derive(Parser, Debug)]
#[command(name = "hoist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "HOIST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .hoist.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Invoke targets against a project
    Run(RunArgs),

    /// Show how targets would be grouped into batches
    Plan(PlanArgs),

    /// Initialize a project-local .hoist.toml config
    Init(InitArgs),

    /// Show or locate configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Targets to invoke, in order
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Global property, repeatable (NAME=VALUE)
    #[arg(short = 'D', long = "property", value_name = "NAME=VALUE")]
    pub properties: Vec<String>,

    /// Batching mode (together | separate); defaults from config
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Bypass the result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Keep invoking remaining batches after a failure
    #[arg(short = 'k', long)]
    pub keep_going: bool,

    /// Write forwarded events as JSON lines to this file
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Targets to group, in order
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Batching mode (together | separate)
    #[arg(short, long, default_value = "together")]
    pub mode: String,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing .hoist.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Action to perform
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommand actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the global config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_properties_and_flags() {
        let cli = Cli::parse_from([
            "hoist", "run", "Build", "Test", "-D", "Configuration=Release", "--no-cache", "-k",
        ]);

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.targets, vec!["Build", "Test"]);
                assert_eq!(args.properties, vec!["Configuration=Release"]);
                assert!(args.no_cache);
                assert!(args.keep_going);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }
}
