//! VS Code extension backup/restore

use crate::BackupComponent;
use async_trait::async_trait;
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Component-owned artifact name: one extension id per line.
pub const EXTENSIONS_FILE: &str = "vscode_extensions.txt";

pub struct VsCodeComponent {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl VsCodeComponent {
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }
}

#[async_trait]
impl BackupComponent for VsCodeComponent {
    fn name(&self) -> &'static str {
        "VSCode"
    }

    fn is_available(&self) -> bool {
        self.executor.binary_exists("code")
    }

    fn is_enabled(&self) -> bool {
        self.config.enable_vscode
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        if !self.is_enabled() || !self.is_available() {
            warn!("VS Code export disabled or 'code' not available, skipping");
            return Ok(false);
        }

        let extensions_file = output_dir.join(EXTENSIONS_FILE);
        self.executor
            .run(
                &format!(
                    r#"code --list-extensions > "{}""#,
                    extensions_file.display()
                ),
                false,
                "Export VS Code extensions",
            )
            .await?;
        Ok(true)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let extensions_file = backup_dir.join(EXTENSIONS_FILE);
        if !extensions_file.exists() {
            warn!("No VS Code extension list found in backup");
            return Ok(false);
        }

        if !self.is_available() {
            warn!("VS Code 'code' command not available");
            return Ok(false);
        }

        if self.executor.confirm("Install VS Code extensions?")? {
            // One install per extension; a failing one must not stop the rest.
            let install_cmd = format!(
                r#"while read -r ext; do [ -z "$ext" ] || code --install-extension "$ext" || true; done < "{}""#,
                extensions_file.display()
            );
            self.executor
                .run(&install_cmd, false, "Install VS Code extensions")
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        if !self.is_enabled() || !self.is_available() {
            return vec!["✗ VS Code export disabled or not installed".to_string()];
        }
        vec!["✓ VS Code extension list".to_string()]
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        let extensions_file = backup_dir.join(EXTENSIONS_FILE);
        if !extensions_file.exists() {
            return vec!["✗ No VS Code extensions".to_string()];
        }

        match std::fs::read_to_string(&extensions_file) {
            Ok(content) => {
                let count = content.lines().filter(|l| !l.trim().is_empty()).count();
                vec![format!("✓ VS Code extensions: {count}")]
            }
            Err(_) => vec!["✓ VS Code extensions".to_string()],
        }
    }
}
