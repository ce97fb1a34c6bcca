//! Homebrew package backup/restore
//!
//! Export writes a `Brewfile` via `brew bundle dump` plus the Homebrew
//! version for reference. Restore offers to install Homebrew itself when
//! missing, then replays the Brewfile with `brew bundle`.

use crate::BackupComponent;
use async_trait::async_trait;
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Component-owned artifact names.
pub const BREWFILE: &str = "Brewfile";
pub const VERSION_FILE: &str = "HOMEBREW_VERSION.txt";

/// Official Homebrew install script, run non-interactively.
const INSTALL_CMD: &str = r#"NONINTERACTIVE=1 /bin/bash -c "$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)""#;

pub struct HomebrewComponent {
    #[allow(dead_code)]
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl HomebrewComponent {
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }
}

#[async_trait]
impl BackupComponent for HomebrewComponent {
    fn name(&self) -> &'static str {
        "Homebrew"
    }

    fn is_available(&self) -> bool {
        self.executor.binary_exists("brew")
    }

    // Homebrew is always enabled when available
    fn is_enabled(&self) -> bool {
        true
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        if !self.is_available() {
            warn!("Homebrew not available, skipping");
            return Ok(false);
        }

        let brewfile = output_dir.join(BREWFILE);
        let version_file = output_dir.join(VERSION_FILE);

        self.executor
            .run(
                &format!(
                    r#"brew bundle dump --file="{}" --force"#,
                    brewfile.display()
                ),
                false,
                "Export Brewfile",
            )
            .await?;
        self.executor
            .run(
                &format!(r#"brew --version > "{}""#, version_file.display()),
                false,
                "Save Homebrew version",
            )
            .await?;
        Ok(true)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let brewfile = backup_dir.join(BREWFILE);
        if !brewfile.exists() {
            warn!("No Brewfile found in backup");
            return Ok(false);
        }

        if !self.is_available() && self.executor.confirm("Install Homebrew?")? {
            self.executor
                .run(INSTALL_CMD, false, "Install Homebrew")
                .await?;
        }

        if self.executor.confirm("Run brew bundle install?")? {
            self.executor
                .run(
                    &format!(r#"brew bundle --file="{}""#, brewfile.display()),
                    false,
                    "Install Brewfile packages",
                )
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        if !self.is_available() {
            return vec!["✗ Homebrew not installed, skipping".to_string()];
        }
        vec!["✓ Homebrew config (Brewfile)".to_string()]
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        let brewfile = backup_dir.join(BREWFILE);
        if !brewfile.exists() {
            return vec!["✗ No Homebrew config".to_string()];
        }

        match std::fs::read_to_string(&brewfile) {
            Ok(content) => {
                let brew_count = content
                    .lines()
                    .filter(|l| l.trim_start().starts_with("brew "))
                    .count();
                let cask_count = content
                    .lines()
                    .filter(|l| l.trim_start().starts_with("cask "))
                    .count();
                vec![format!(
                    "✓ Homebrew: {brew_count} packages, {cask_count} apps"
                )]
            }
            Err(_) => vec!["✓ Homebrew config file".to_string()],
        }
    }
}
