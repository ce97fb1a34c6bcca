//! Doctor command - environment health checks

use crate::cli::Cli;
use crate::commands::{executor, load_config};
use crate::output;
use anyhow::Result;
use myconfig_doctor::{CheckStatus, Doctor};

pub async fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let executor = executor(&config);
    let doctor = Doctor::new(config, executor);

    output::header("Environment checks");
    let results = doctor.run_all().await;
    for result in &results {
        let line = format!("{}: {}", result.name, result.detail);
        match result.status {
            CheckStatus::Pass => output::success(&line),
            CheckStatus::Warn => output::warning(&line),
            CheckStatus::Fail => output::error(&line),
        }
    }

    if Doctor::healthy(&results) {
        output::success("Machine is ready for backup and restore");
        Ok(())
    } else {
        anyhow::bail!("One or more checks failed");
    }
}
