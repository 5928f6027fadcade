//! `init` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use tracing::info;

use crate::cli::InitArgs;
use crate::error::CliError;

/// Execute the `init` command
pub fn run_init(args: &InitArgs) -> Result<()> {
    if args.config.exists() && !args.force {
        return Err(CliError::config_exists(args.config.display().to_string()).into());
    }

    ConfigLoader::write_default(&args.config)
        .with_context(|| format!("Failed to write config to {}", args.config.display()))?;

    info!(path = %args.config.display(), "Default configuration written");
    println!("✓ Wrote default configuration: {}", args.config.display());
    Ok(())
}
