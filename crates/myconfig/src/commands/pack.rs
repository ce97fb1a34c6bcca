//! Pack and unpack commands - portable backup archives

use crate::cli::{Cli, PackArgs, UnpackArgs};
use crate::commands::{executor, load_config};
use crate::output;
use anyhow::Result;
use myconfig_backup::BackupManager;

pub async fn run_pack(args: &PackArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let executor = executor(&config);
    let manager = BackupManager::new(config, executor);

    output::header(&format!("Packing {}", args.dir));
    let spinner = output::spinner("Creating archive");
    let result = manager
        .pack(
            args.dir.as_std_path(),
            args.outfile.as_ref().map(|p| p.as_std_path()),
            args.gpg,
        )
        .await;
    spinner.finish_and_clear();
    let outfile = result?;
    output::success(&format!("Archive written to {}", outfile.display()));
    Ok(())
}

pub async fn run_unpack(args: &UnpackArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let executor = executor(&config);
    let manager = BackupManager::new(config, executor);

    output::header(&format!("Unpacking {} into {}", args.archive, args.dir));
    manager
        .unpack(args.archive.as_std_path(), args.dir.as_std_path())
        .await?;
    output::success(&format!("Backup unpacked to {}", args.dir));
    Ok(())
}
