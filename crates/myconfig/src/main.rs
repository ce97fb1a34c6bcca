//! myconfig CLI - macOS configuration backup and restore
//!
//! This is the main entry point for the myconfig command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Ctrl-C aborts the whole run with the conventional interrupt code.
    tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            output::warning("Interrupted");
            std::process::exit(130);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Export(args) => commands::export::run(args, &cli).await,
        Commands::Restore(args) => commands::restore::run(args, &cli).await,
        Commands::Preview(args) => commands::preview::run(args, &cli).await,
        Commands::Doctor => commands::doctor::run(&cli).await,
        Commands::Defaults(args) => commands::defaults::run(args, &cli).await,
        Commands::Diff(args) => commands::diff::run(args, &cli).await,
        Commands::Pack(args) => commands::pack::run_pack(args, &cli).await,
        Commands::Unpack(args) => commands::pack::run_unpack(args, &cli).await,
        Commands::Profile(args) => commands::profile::run(args, &cli),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
