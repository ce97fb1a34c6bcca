//! Restore command - replay a backup onto this machine

use crate::cli::{Cli, RestoreArgs};
use crate::commands::{executor, load_config};
use crate::output;
use anyhow::Result;
use myconfig_backup::BackupManager;

pub async fn run(args: &RestoreArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let executor = executor(&config);
    let manager = BackupManager::new(config, executor);

    output::header(&format!("Restoring configuration from {}", args.dir));
    let restored = manager.restore(args.dir.as_std_path()).await?;

    if restored == 0 {
        output::warning("No component applied any data");
    } else {
        output::success(&format!("Restore finished ({restored} components)"));
    }
    Ok(())
}
