//! Defaults command - direct `defaults` domain export/import

use crate::cli::{Cli, DefaultsCommands};
use crate::commands::{executor, load_config};
use crate::output;
use anyhow::Result;
use myconfig_components::DefaultsComponent;
use myconfig_core::utils::timestamp;
use std::path::PathBuf;

pub async fn run(args: &DefaultsCommands, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let executor = executor(&config);
    let component = DefaultsComponent::new(config, executor);

    match args {
        DefaultsCommands::ExportAll(export) => {
            let dir: PathBuf = match &export.dir {
                Some(dir) => dir.as_std_path().to_path_buf(),
                None => PathBuf::from(format!("defaults-dump-{}", timestamp())),
            };
            output::header(&format!("Dumping all defaults domains to {}", dir.display()));
            let exported = component.export_all(&dir).await?;
            output::success(&format!("Exported {exported} domains"));
        }
        DefaultsCommands::Import(import) => {
            output::header(&format!("Importing defaults domains from {}", import.dir));
            let imported = component.import_dir(import.dir.as_std_path()).await?;
            if imported == 0 {
                output::warning("Nothing imported");
            } else {
                output::success(&format!("Imported {imported} domains"));
            }
        }
    }
    Ok(())
}
