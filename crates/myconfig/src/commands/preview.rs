//! Preview command - describe what export/restore would do

use crate::cli::{Cli, PreviewCommands};
use crate::commands::{executor, load_config};
use crate::output;
use anyhow::Result;
use myconfig_backup::BackupManager;
use std::path::PathBuf;

pub async fn run(args: &PreviewCommands, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let executor = executor(&config);
    let manager = BackupManager::new(config, executor);

    let lines = match args {
        PreviewCommands::Export(export) => {
            let dir: PathBuf = match &export.dir {
                Some(dir) => dir.as_std_path().to_path_buf(),
                None => manager.default_backup_dir(),
            };
            manager.preview_export(&dir).await
        }
        PreviewCommands::Restore(restore) => {
            manager.preview_restore(restore.dir.as_std_path()).await
        }
    };

    let mut lines = lines.into_iter();
    if let Some(header) = lines.next() {
        output::header(&header);
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
