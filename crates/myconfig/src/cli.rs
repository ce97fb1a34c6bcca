//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// myconfig - macOS configuration backup and restore
#[derive(Parser, Debug)]
#[command(name = "myconfig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Answer yes to all confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Log commands instead of executing them
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Skip the Mac App Store component
    #[arg(long, global = true)]
    pub no_mas: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the machine configuration into a backup directory
    Export(ExportArgs),

    /// Restore a backup onto this machine
    Restore(RestoreArgs),

    /// Show what export or restore would do, without doing it
    #[command(subcommand)]
    Preview(PreviewCommands),

    /// Check this machine for required tools and sign-ins
    Doctor,

    /// Work with `defaults` preference domains directly
    #[command(subcommand)]
    Defaults(DefaultsCommands),

    /// Compare two backup directories
    Diff(DiffArgs),

    /// Pack a backup directory into a tar.gz archive
    Pack(PackArgs),

    /// Unpack a packed backup archive
    Unpack(UnpackArgs),

    /// Configuration profile management
    #[command(subcommand)]
    Profile(ProfileCommands),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Backup directory (default: backups/backup-<timestamp>)
    pub dir: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup directory to restore from
    pub dir: Utf8PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum PreviewCommands {
    /// Preview an export
    Export(ExportArgs),

    /// Preview a restore
    Restore(RestoreArgs),
}

#[derive(Subcommand, Debug)]
pub enum DefaultsCommands {
    /// Export every registered domain, minus the exclude list
    ExportAll(ExportArgs),

    /// Import every plist in a directory
    Import(RestoreArgs),
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// First backup directory
    pub a: Utf8PathBuf,

    /// Second backup directory
    pub b: Utf8PathBuf,
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Backup directory to pack
    pub dir: Utf8PathBuf,

    /// Output archive (default: <dir>.tar.gz)
    pub outfile: Option<Utf8PathBuf>,

    /// Encrypt the archive with gpg symmetric encryption
    #[arg(long)]
    pub gpg: bool,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Archive produced by `myconfig pack`
    pub archive: Utf8PathBuf,

    /// Directory to unpack into (must not exist)
    pub dir: Utf8PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List saved configuration profiles
    List,

    /// Replace the active config with a saved profile
    Use {
        /// Profile name
        name: String,
    },

    /// Save the active config as a named profile
    Save {
        /// Profile name
        name: String,
    },
}
