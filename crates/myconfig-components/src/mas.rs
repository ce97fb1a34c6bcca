//! Mac App Store application backup/restore
//!
//! Export captures `mas list` ("<id> <name>" per line) into `mas.list`.
//! Restore replays the list one app at a time, tolerating per-app install
//! failures. App Store installs require a signed-in account, which only
//! the user can arrange, so restore warns before starting.

use crate::BackupComponent;
use async_trait::async_trait;
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Component-owned artifact name.
pub const MAS_LIST: &str = "mas.list";

pub struct MasComponent {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl MasComponent {
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }
}

#[async_trait]
impl BackupComponent for MasComponent {
    fn name(&self) -> &'static str {
        "MAS"
    }

    fn is_available(&self) -> bool {
        self.executor.binary_exists("mas")
    }

    fn is_enabled(&self) -> bool {
        self.config.enable_mas
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        if !self.is_enabled() || !self.is_available() {
            warn!("MAS export disabled or mas not available, skipping");
            return Ok(false);
        }

        let list_file = output_dir.join(MAS_LIST);
        self.executor
            .run(
                &format!(r#"mas list > "{}""#, list_file.display()),
                false,
                "Export MAS app list",
            )
            .await?;
        Ok(true)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let list_file = backup_dir.join(MAS_LIST);
        if !list_file.exists() {
            warn!("No MAS app list found in backup");
            return Ok(false);
        }

        if !self.is_available() {
            if !self
                .executor
                .confirm("mas CLI not found. Install it with Homebrew?")?
            {
                warn!("mas CLI missing, skipping MAS restore");
                return Ok(false);
            }
            self.executor
                .run("brew install mas", false, "Install mas CLI")
                .await?;
        }

        warn!("Please sign in to the App Store before installing");
        if self.executor.confirm("Install the MAS app list now?")? {
            // One install per app id; a failing app must not stop the rest.
            let install_cmd = format!(
                r#"awk '{{print $1}}' "{}" | while read -r id; do [ -z "$id" ] || mas install "$id" || true; done"#,
                list_file.display()
            );
            self.executor
                .run(&install_cmd, false, "Install MAS apps")
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        if !self.is_enabled() || !self.is_available() {
            return vec!["✗ MAS export disabled or not installed".to_string()];
        }
        vec!["✓ Mac App Store app list".to_string()]
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        let list_file = backup_dir.join(MAS_LIST);
        if !list_file.exists() {
            return vec!["✗ No MAS app list".to_string()];
        }

        match std::fs::read_to_string(&list_file) {
            Ok(content) => {
                let app_count = content.lines().filter(|l| !l.trim().is_empty()).count();
                vec![format!("✓ Mac App Store: {app_count} apps")]
            }
            Err(_) => vec!["✓ Mac App Store app list".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myconfig_core::ScriptedExecutor;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_disabled_by_config() {
        let executor = Arc::new(ScriptedExecutor::new().with_binary("mas"));
        let config = AppConfig::default().with_enable_mas(false);
        let component = MasComponent::new(config, executor.clone());
        let dir = TempDir::new().unwrap();

        assert!(!component.export(dir.path()).await.unwrap());
        assert!(executor.commands().is_empty());
    }

    #[tokio::test]
    async fn test_export_writes_list() {
        let executor = Arc::new(ScriptedExecutor::new().with_binary("mas"));
        let component = MasComponent::new(AppConfig::default(), executor.clone());
        let dir = TempDir::new().unwrap();

        assert!(component.export(dir.path()).await.unwrap());
        assert!(executor.commands()[0].contains("mas list"));
        assert!(executor.commands()[0].contains(MAS_LIST));
    }

    #[tokio::test]
    async fn test_restore_installs_mas_when_missing() {
        let executor = Arc::new(ScriptedExecutor::new());
        let component = MasComponent::new(AppConfig::default(), executor.clone());
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MAS_LIST), "497799835 Xcode\n").unwrap();

        assert!(component.restore(dir.path()).await.unwrap());
        let commands = executor.commands();
        assert_eq!(commands[0], "brew install mas");
        assert!(commands[1].contains("mas install"));
    }

    #[tokio::test]
    async fn test_restore_declined_install_runs_nothing() {
        let executor = Arc::new(ScriptedExecutor::new().with_confirm(false));
        let component = MasComponent::new(AppConfig::default(), executor.clone());
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MAS_LIST), "497799835 Xcode\n").unwrap();

        assert!(!component.restore(dir.path()).await.unwrap());
        assert!(executor.commands().is_empty());
    }

    #[tokio::test]
    async fn test_preview_restore_counts_apps() {
        let executor = Arc::new(ScriptedExecutor::new().with_binary("mas"));
        let component = MasComponent::new(AppConfig::default(), executor);
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(MAS_LIST),
            "497799835 Xcode\n1333542190 1Password\n",
        )
        .unwrap();

        let preview = component.preview_restore(dir.path()).await;
        assert_eq!(preview, vec!["✓ Mac App Store: 2 apps"]);
    }
}
