//! macOS `defaults` preference domain backup/restore
//!
//! Export serializes an allow-listed set of preference domains to
//! `defaults/<domain>.plist`, skipping domains the system does not know
//! about. Restore snapshots each domain's current state before importing,
//! then nudges Dock and Finder to pick up the changes. A separate
//! full-dump path exports every registered domain minus an exclude list.

use crate::BackupComponent;
use anyhow::Context;
use async_trait::async_trait;
use myconfig_core::utils::{read_list_file, timestamp};
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Subdirectory holding one plist per exported domain.
pub const DEFAULTS_DIR: &str = "defaults";

pub struct DefaultsComponent {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
    home: Option<PathBuf>,
}

impl DefaultsComponent {
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

    /// Domains currently registered with `defaults`, per `defaults domains`
    /// (comma-separated on a single line).
    async fn registered_domains(&self) -> Vec<String> {
        let (code, output) = self.executor.capture("defaults domains").await;
        if code != 0 {
            warn!("`defaults domains` failed, assuming no registered domains");
            return Vec::new();
        }
        output
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Exports the given domains to `<output_dir>/defaults/<domain>.plist`.
    async fn export_domains(&self, output_dir: &Path, domains: &[String]) -> anyhow::Result<usize> {
        let defaults_dir = output_dir.join(DEFAULTS_DIR);
        if !self.executor.is_dry_run() {
            std::fs::create_dir_all(&defaults_dir)
                .with_context(|| format!("Failed to create {}", defaults_dir.display()))?;
        }

        let mut exported = 0usize;
        for domain in domains {
            let plist = defaults_dir.join(format!("{domain}.plist"));
            let code = self
                .executor
                .run(
                    &format!(r#"defaults export {domain} "{}""#, plist.display()),
                    false,
                    "Export defaults domain",
                )
                .await?;
            if code == 0 {
                exported += 1;
            } else {
                warn!("Failed to export defaults domain {domain}");
            }
        }
        Ok(exported)
    }

    /// Exports every registered domain except those matching the exclude
    /// list, plus NSGlobalDomain (which `defaults domains` never reports).
    pub async fn export_all(&self, output_dir: &Path) -> anyhow::Result<usize> {
        if !self.is_available() {
            warn!("`defaults` not available, skipping");
            return Ok(0);
        }

        let excludes = read_list_file(Path::new(&self.config.defaults_exclude_file));
        let mut domains: Vec<String> = self
            .registered_domains()
            .await
            .into_iter()
            .filter(|d| !excludes.iter().any(|pat| d.contains(pat.as_str())))
            .collect();
        domains.push("NSGlobalDomain".to_string());

        let exported = self.export_domains(output_dir, &domains).await?;
        info!("Exported {exported} defaults domains");
        Ok(exported)
    }

    /// Imports every `.plist` in `dir`. For a domain that is already
    /// registered, the live value is first exported to a timestamped plist
    /// in the home directory so a bad import can be rolled back by hand.
    pub async fn import_dir(&self, dir: &Path) -> anyhow::Result<usize> {
        let plists = plist_files(dir)?;
        if plists.is_empty() {
            warn!("No plist files found in {}", dir.display());
            return Ok(0);
        }

        let home = self
            .home
            .clone()
            .or_else(dirs::home_dir)
            .context("Home directory not resolvable")?;
        let registered = self.registered_domains().await;
        let ts = timestamp();

        let mut imported = 0usize;
        for plist in &plists {
            let Some(domain) = plist.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if registered.iter().any(|d| d == domain) {
                let snapshot = home.join(format!("defaults_backup_{domain}_{ts}.plist"));
                self.executor
                    .run(
                        &format!(r#"defaults export {domain} "{}""#, snapshot.display()),
                        false,
                        "Snapshot current defaults domain",
                    )
                    .await?;
            }
            let code = self
                .executor
                .run(
                    &format!(r#"defaults import {domain} "{}""#, plist.display()),
                    false,
                    "Import defaults domain",
                )
                .await?;
            if code == 0 {
                imported += 1;
            } else {
                warn!("Failed to import defaults domain {domain}");
            }
        }

        if imported > 0 {
            // Dock and Finder cache preferences aggressively.
            self.executor
                .run(
                    "killall Dock || true; killall Finder || true",
                    false,
                    "Restart Dock and Finder",
                )
                .await?;
        }
        Ok(imported)
    }
}

#[async_trait]
impl BackupComponent for DefaultsComponent {
    fn name(&self) -> &'static str {
        "Defaults"
    }

    fn is_available(&self) -> bool {
        self.executor.binary_exists("defaults")
    }

    fn is_enabled(&self) -> bool {
        self.config.enable_defaults
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        if !self.is_enabled() || !self.is_available() {
            warn!("defaults export disabled or `defaults` not available, skipping");
            return Ok(false);
        }

        let wanted = read_list_file(Path::new(&self.config.defaults_domains_file));
        if wanted.is_empty() {
            warn!(
                "No domains listed in {}, skipping defaults export",
                self.config.defaults_domains_file
            );
            return Ok(false);
        }

        let registered = self.registered_domains().await;
        let (known, unknown): (Vec<String>, Vec<String>) = wanted
            .into_iter()
            .partition(|d| registered.contains(d) || d == "NSGlobalDomain");
        for domain in &unknown {
            warn!("Domain {domain} is not registered on this machine, skipping");
        }

        let exported = self.export_domains(output_dir, &known).await?;
        Ok(exported > 0)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let defaults_dir = backup_dir.join(DEFAULTS_DIR);
        if !defaults_dir.is_dir() {
            warn!("No defaults directory found in backup");
            return Ok(false);
        }
        if !self.is_available() {
            warn!("`defaults` not available");
            return Ok(false);
        }

        if !self
            .executor
            .confirm("Import defaults preference domains?")?
        {
            return Ok(false);
        }

        let imported = self.import_dir(&defaults_dir).await?;
        Ok(imported > 0)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        if !self.is_enabled() || !self.is_available() {
            return vec!["✗ defaults export disabled or unavailable".to_string()];
        }
        let wanted = read_list_file(Path::new(&self.config.defaults_domains_file));
        if wanted.is_empty() {
            return vec!["✗ No defaults domains listed".to_string()];
        }
        vec![format!("✓ Defaults: {} domains", wanted.len())]
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        let defaults_dir = backup_dir.join(DEFAULTS_DIR);
        match plist_files(&defaults_dir) {
            Ok(plists) if !plists.is_empty() => {
                vec![format!("✓ Defaults: {} domains", plists.len())]
            }
            _ => vec!["✗ No defaults domains".to_string()],
        }
    }
}

/// Plist files directly under `dir`, sorted by name for stable ordering.
fn plist_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut plists: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "plist"))
        .collect();
    plists.sort();
    Ok(plists)
}
