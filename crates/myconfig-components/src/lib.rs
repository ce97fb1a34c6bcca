//! Backup components
//!
//! Each component snapshots one external subsystem (Homebrew, Mac App
//! Store, VS Code, package managers, dotfiles, `defaults` domains,
//! LaunchAgents) into its own subtree of a backup directory, and can later
//! replay that subtree onto the live system. Components are independent of
//! each other: no component reads or writes another component's files.
//!
//! All shelling out goes through the [`CommandExecutor`] capability from
//! `myconfig-core`, which keeps every component testable against a
//! scripted executor and gives dry-run a single choke point.

use async_trait::async_trait;
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::Path;
use std::sync::Arc;

pub mod defaults;
pub mod dotfiles;
pub mod homebrew;
pub mod launch_agents;
pub mod mas;
pub mod packages;
pub mod security;
pub mod vscode;

pub use defaults::DefaultsComponent;
pub use dotfiles::DotfilesComponent;
pub use homebrew::HomebrewComponent;
pub use launch_agents::LaunchAgentsComponent;
pub use mas::MasComponent;
pub use packages::{NpmComponent, PipUserComponent, PipxComponent};
pub use security::{is_sensitive_path, SENSITIVE_PATTERNS};
pub use vscode::VsCodeComponent;

/// Capability interface implemented by every backup target.
///
/// `export` and `restore` must tolerate ordinary absence-of-data
/// conditions (tool not installed, artifact missing from the backup):
/// those are reported as `Ok(false)` plus a warning log, never as errors.
/// Errors are reserved for unexpected I/O failures.
#[async_trait]
pub trait BackupComponent: Send + Sync {
    /// Component name for logging and the manifest.
    fn name(&self) -> &'static str;

    /// True if the underlying tool/resource exists on this machine.
    /// No side effects.
    fn is_available(&self) -> bool;

    /// True if configuration permits this component to run.
    /// Independent of availability.
    fn is_enabled(&self) -> bool;

    /// Snapshots this component's data under `output_dir`. Returns whether
    /// any data was captured.
    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool>;

    /// Re-applies previously exported data to the live system. Returns
    /// whether any action was taken.
    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool>;

    /// Side-effect-free description of what `export` would do.
    async fn preview_export(&self, output_dir: &Path) -> Vec<String>;

    /// Side-effect-free description of what `restore` would do.
    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String>;
}

/// Builds the full component set in the fixed orchestration order:
/// package managers first, then dotfiles, preferences, and services.
pub fn default_components(
    config: &AppConfig,
    executor: Arc<dyn CommandExecutor>,
) -> Vec<Box<dyn BackupComponent>> {
    vec![
        Box::new(HomebrewComponent::new(config.clone(), executor.clone())),
        Box::new(MasComponent::new(config.clone(), executor.clone())),
        Box::new(VsCodeComponent::new(config.clone(), executor.clone())),
        Box::new(NpmComponent::new(config.clone(), executor.clone())),
        Box::new(PipxComponent::new(config.clone(), executor.clone())),
        Box::new(PipUserComponent::new(config.clone(), executor.clone())),
        Box::new(DotfilesComponent::new(config.clone(), executor.clone())),
        Box::new(DefaultsComponent::new(config.clone(), executor.clone())),
        Box::new(LaunchAgentsComponent::new(config.clone(), executor)),
    ]
}
