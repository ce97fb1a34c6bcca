//! Language package manager backup/restore (npm, pipx, pip --user)
//!
//! All three follow the same shape as the MAS and VS Code components:
//! export a plain-text package list, restore by replaying it with per-item
//! failure tolerance. They are disabled by default and opt-in via
//! configuration.

use crate::BackupComponent;
use async_trait::async_trait;
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub const NPM_GLOBALS: &str = "npm_globals.txt";
pub const PIPX_LIST: &str = "pipx_list.txt";
pub const PIP_USER_FREEZE: &str = "pip_user_freeze.txt";

pub struct NpmComponent {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl NpmComponent {
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }
}

#[async_trait]
impl BackupComponent for NpmComponent {
    fn name(&self) -> &'static str {
        "Npm"
    }

    fn is_available(&self) -> bool {
        self.executor.binary_exists("npm")
    }

    fn is_enabled(&self) -> bool {
        self.config.enable_npm
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        if !self.is_enabled() || !self.is_available() {
            warn!("npm export disabled or npm not available, skipping");
            return Ok(false);
        }

        let list_file = output_dir.join(NPM_GLOBALS);
        // Package names only, one per line; npm itself is dropped.
        let cmd = format!(
            r#"npm -g list --depth=0 --parseable 2>/dev/null | tail -n +2 | awk -F/ '{{print $NF}}' | sed '/^npm$/d;/^$/d' > "{}""#,
            list_file.display()
        );
        self.executor
            .run(&cmd, false, "Export npm global packages")
            .await?;
        Ok(true)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let list_file = backup_dir.join(NPM_GLOBALS);
        if !list_file.exists() || !self.is_available() {
            return Ok(false);
        }

        if self.executor.confirm("Install npm global packages?")? {
            let cmd = format!(
                r#"while read -r pkg; do [ -z "$pkg" ] || npm -g install "$pkg" || true; done < "{}""#,
                list_file.display()
            );
            self.executor
                .run(&cmd, false, "Install npm global packages")
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        if !self.is_enabled() || !self.is_available() {
            return vec!["✗ npm export disabled or not installed".to_string()];
        }
        vec!["✓ npm global package list".to_string()]
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        preview_list_file(&backup_dir.join(NPM_GLOBALS), "npm global packages")
    }
}

pub struct PipxComponent {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl PipxComponent {
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }
}

#[async_trait]
impl BackupComponent for PipxComponent {
    fn name(&self) -> &'static str {
        "Pipx"
    }

    fn is_available(&self) -> bool {
        self.executor.binary_exists("pipx")
    }

    fn is_enabled(&self) -> bool {
        self.config.enable_pipx
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        if !self.is_enabled() || !self.is_available() {
            warn!("pipx export disabled or pipx not available, skipping");
            return Ok(false);
        }

        let list_file = output_dir.join(PIPX_LIST);
        self.executor
            .run(
                &format!(r#"pipx list > "{}""#, list_file.display()),
                false,
                "Export pipx package list",
            )
            .await?;
        Ok(true)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let list_file = backup_dir.join(PIPX_LIST);
        if !list_file.exists() || !self.is_available() {
            return Ok(false);
        }

        if self.executor.confirm("Reinstall pipx packages?")? {
            // `pipx list` lines look like "package black 23.1.0, ..."
            let cmd = format!(
                r#"awk '/package /{{print $2}}' "{}" | while read -r pkg; do [ -z "$pkg" ] || pipx install "$pkg" || true; done"#,
                list_file.display()
            );
            self.executor
                .run(&cmd, false, "Install pipx packages")
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        if !self.is_enabled() || !self.is_available() {
            return vec!["✗ pipx export disabled or not installed".to_string()];
        }
        vec!["✓ pipx package list".to_string()]
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        if backup_dir.join(PIPX_LIST).exists() {
            vec!["✓ pipx package list".to_string()]
        } else {
            vec!["✗ No pipx package list".to_string()]
        }
    }
}

pub struct PipUserComponent {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl PipUserComponent {
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }
}

#[async_trait]
impl BackupComponent for PipUserComponent {
    fn name(&self) -> &'static str {
        "PipUser"
    }

    fn is_available(&self) -> bool {
        self.executor.binary_exists("pip")
    }

    fn is_enabled(&self) -> bool {
        self.config.enable_pip_user
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        if !self.is_enabled() || !self.is_available() {
            warn!("pip user export disabled or pip not available, skipping");
            return Ok(false);
        }

        let freeze_file = output_dir.join(PIP_USER_FREEZE);
        self.executor
            .run(
                &format!(r#"pip freeze --user > "{}""#, freeze_file.display()),
                false,
                "Export pip user packages",
            )
            .await?;
        Ok(true)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let freeze_file = backup_dir.join(PIP_USER_FREEZE);
        if !freeze_file.exists() || !self.is_available() {
            return Ok(false);
        }

        if self.executor.confirm("pip install --user the frozen requirements?")? {
            self.executor
                .run(
                    &format!(r#"pip install --user -r "{}""#, freeze_file.display()),
                    false,
                    "Install pip user packages",
                )
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        if !self.is_enabled() || !self.is_available() {
            return vec!["✗ pip user export disabled or not installed".to_string()];
        }
        vec!["✓ pip user package list".to_string()]
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        preview_list_file(&backup_dir.join(PIP_USER_FREEZE), "pip user packages")
    }
}

fn preview_list_file(path: &Path, label: &str) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let count = content.lines().filter(|l| !l.trim().is_empty()).count();
            vec![format!("✓ {label}: {count}")]
        }
        Err(_) => vec![format!("✗ No {label}")],
    }
}
