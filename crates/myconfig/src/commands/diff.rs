//! Diff command - compare two backup directories
//!
//! Delegates to the system `diff`; archives and logs are excluded because
//! they differ on every export without carrying meaningful changes.

use crate::cli::{Cli, DiffArgs};
use crate::commands::{executor, load_config};
use crate::output;
use anyhow::Result;

pub async fn run(args: &DiffArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let executor = executor(&config);

    anyhow::ensure!(
        args.a.as_std_path().is_dir(),
        "Backup directory not found: {}",
        args.a
    );
    anyhow::ensure!(
        args.b.as_std_path().is_dir(),
        "Backup directory not found: {}",
        args.b
    );

    output::header(&format!("Comparing {} and {}", args.a, args.b));
    let cmd = format!(
        r#"diff -r -x '*.tar.gz' -x '*.gpg' -x '*.log' -x 'MANIFEST.json' -x 'ENVIRONMENT.txt' "{}" "{}""#,
        args.a, args.b
    );
    // diff exits 1 when the trees differ; only >1 is an error.
    let code = executor.run(&cmd, false, "Compare backups").await?;
    match code {
        0 => output::success("Backups are identical"),
        1 => output::info("Backups differ (see above)"),
        _ => anyhow::bail!("diff failed with exit code {code}"),
    }
    Ok(())
}
