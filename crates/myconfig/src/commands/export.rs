//! Export command - snapshot the machine configuration

use crate::cli::{Cli, ExportArgs};
use crate::commands::{executor, load_config};
use crate::output;
use anyhow::Result;
use myconfig_backup::BackupManager;
use std::path::PathBuf;

pub async fn run(args: &ExportArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let executor = executor(&config);
    let manager = BackupManager::new(config, executor);

    let dir: PathBuf = match &args.dir {
        Some(dir) => dir.as_std_path().to_path_buf(),
        None => manager.default_backup_dir(),
    };

    output::header(&format!("Exporting configuration to {}", dir.display()));
    let captured = manager.export(&dir).await?;

    if captured == 0 {
        output::warning("No component captured any data");
    } else {
        output::success(&format!(
            "Backup written to {} ({captured} components)",
            dir.display()
        ));
    }
    Ok(())
}
