//! User LaunchAgent backup/restore
//!
//! Copies the plists under `~/Library/LaunchAgents` into a `LaunchAgents/`
//! subdirectory of the backup. Restore copies them back and, after
//! confirmation, loads each one with `launchctl load -w`, tolerating
//! per-agent failures (an agent may already be loaded).

use crate::BackupComponent;
use anyhow::Context;
use async_trait::async_trait;
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Subdirectory holding the copied agent plists.
pub const LAUNCH_AGENTS_DIR: &str = "LaunchAgents";

pub struct LaunchAgentsComponent {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
    home: Option<PathBuf>,
}

impl LaunchAgentsComponent {
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            config,
            executor,
            home: None,
        }
    }

    /// Overrides the home directory, for tests.
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = Some(home);
        self
    }

    fn agents_dir(&self) -> Option<PathBuf> {
        self.home
            .clone()
            .or_else(dirs::home_dir)
            .map(|home| home.join("Library/LaunchAgents"))
    }
}

#[async_trait]
impl BackupComponent for LaunchAgentsComponent {
    fn name(&self) -> &'static str {
        "LaunchAgents"
    }

    fn is_available(&self) -> bool {
        self.agents_dir().is_some_and(|dir| dir.is_dir())
    }

    fn is_enabled(&self) -> bool {
        self.config.enable_launchagents
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        if !self.is_enabled() {
            warn!("LaunchAgents export disabled, skipping");
            return Ok(false);
        }
        let Some(agents_dir) = self.agents_dir().filter(|dir| dir.is_dir()) else {
            warn!("No user LaunchAgents directory, skipping");
            return Ok(false);
        };

        let plists = plist_files(&agents_dir)?;
        if plists.is_empty() {
            warn!("No LaunchAgent plists found");
            return Ok(false);
        }

        let dest_dir = output_dir.join(LAUNCH_AGENTS_DIR);
        if self.executor.is_dry_run() {
            info!(
                "[dry-run] would copy {} LaunchAgent plists into {}",
                plists.len(),
                dest_dir.display()
            );
            return Ok(true);
        }

        std::fs::create_dir_all(&dest_dir)
            .with_context(|| format!("Failed to create {}", dest_dir.display()))?;
        for plist in &plists {
            let Some(name) = plist.file_name() else {
                continue;
            };
            std::fs::copy(plist, dest_dir.join(name))
                .with_context(|| format!("Failed to copy {}", plist.display()))?;
        }

        info!("Copied {} LaunchAgent plists", plists.len());
        Ok(true)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let source_dir = backup_dir.join(LAUNCH_AGENTS_DIR);
        if !source_dir.is_dir() {
            warn!("No LaunchAgents directory found in backup");
            return Ok(false);
        }
        let Some(agents_dir) = self.agents_dir() else {
            warn!("Home directory not resolvable, skipping LaunchAgents");
            return Ok(false);
        };

        let plists = plist_files(&source_dir)?;
        if plists.is_empty() {
            warn!("No LaunchAgent plists in backup");
            return Ok(false);
        }

        if !self
            .executor
            .confirm("Restore and load user LaunchAgents?")?
        {
            return Ok(false);
        }

        if self.executor.is_dry_run() {
            info!(
                "[dry-run] would copy {} plists into {}",
                plists.len(),
                agents_dir.display()
            );
            return Ok(true);
        }

        std::fs::create_dir_all(&agents_dir)
            .with_context(|| format!("Failed to create {}", agents_dir.display()))?;
        for plist in &plists {
            let Some(name) = plist.file_name() else {
                continue;
            };
            let dest = agents_dir.join(name);
            std::fs::copy(plist, &dest)
                .with_context(|| format!("Failed to copy {}", plist.display()))?;
            // May already be loaded; tolerate.
            self.executor
                .run(
                    &format!(r#"launchctl load -w "{}""#, dest.display()),
                    false,
                    "Load LaunchAgent",
                )
                .await?;
        }

        info!("Restored {} LaunchAgents", plists.len());
        Ok(true)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        if !self.is_enabled() {
            return vec!["✗ LaunchAgents export disabled".to_string()];
        }
        match self.agents_dir().filter(|dir| dir.is_dir()) {
            Some(dir) => match plist_files(&dir) {
                Ok(plists) if !plists.is_empty() => {
                    vec![format!("✓ LaunchAgents: {} plists", plists.len())]
                }
                _ => vec!["✗ No LaunchAgent plists".to_string()],
            },
            None => vec!["✗ No user LaunchAgents directory".to_string()],
        }
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        let source_dir = backup_dir.join(LAUNCH_AGENTS_DIR);
        match plist_files(&source_dir) {
            Ok(plists) if !plists.is_empty() => {
                vec![format!("✓ LaunchAgents: {} plists", plists.len())]
            }
            _ => vec!["✗ No LaunchAgents".to_string()],
        }
    }
}

fn plist_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(Vec::new());
    };
    let mut plists: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "plist"))
        .collect();
    plists.sort();
    Ok(plists)
}
