//! Command implementations

pub mod defaults;
pub mod diff;
pub mod doctor;
pub mod export;
pub mod pack;
pub mod preview;
pub mod profile;
pub mod restore;

use crate::cli::Cli;
use anyhow::Result;
use myconfig_core::{AppConfig, CommandExecutor, ConfigManager, SystemExecutor};
use std::sync::Arc;

/// Loads the config file and folds the global CLI flags into it.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::new(path.as_std_path()),
        None => ConfigManager::default_location(),
    };
    let mut config = manager.load()?;

    if cli.yes {
        config = config.with_interactive(false);
    }
    if cli.no_mas {
        config = config.with_enable_mas(false);
    }
    config = config
        .with_dry_run(cli.dry_run)
        .with_verbose(cli.verbose > 0)
        .with_quiet(cli.quiet);
    Ok(config)
}

/// Builds the production executor for the given configuration.
pub fn executor(config: &AppConfig) -> Arc<dyn CommandExecutor> {
    Arc::new(SystemExecutor::new(config.clone()))
}
