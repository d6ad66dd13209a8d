//! Init command - create project-local .hoist.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_NAME;
use crate::error::{HoistError, HoistResult};
use console::style;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# Hoist project configuration
# Settings here override your global config (~/.config/hoist/config.toml)

[invoke]
# mode = "together"              # together | separate
# use_cache = true
# stop_on_first_failure = true

[targets]
# Build = "make build"
# Test = "make test"
# Clean = "make clean"
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> HoistResult<()> {
    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => {
            std::env::current_dir().map_err(|e| HoistError::io("getting current directory", e))?
        }
    };

    let config_path = target_dir.join(LOCAL_CONFIG_NAME);

    if config_path.exists() && !args.force {
        return Err(HoistError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    fs::create_dir_all(&target_dir)
        .await
        .map_err(|e| HoistError::io(format!("creating {}", target_dir.display()), e))?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| HoistError::io(format!("writing {}", config_path.display()), e))?;

    println!(
        "{} {}",
        style("Created project config:").green().bold(),
        config_path.display()
    );

    Ok(())
}
