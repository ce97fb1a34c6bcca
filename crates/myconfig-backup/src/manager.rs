//! Backup orchestration
//!
//! [`BackupManager`] drives the component set in a fixed order and owns the
//! files that belong to the backup as a whole: the `ENVIRONMENT.txt`
//! marker written before any component runs, and `MANIFEST.json` plus
//! `README.md` written after the last one. Component failures are logged
//! and do not stop the remaining components.

use crate::archive::{create_tar_gz, extract_tar_gz};
use crate::manifest::Manifest;
use crate::verify::{verify_backup, ENVIRONMENT_FILE};
use anyhow::Context;
use chrono::Utc;
use myconfig_components::{default_components, BackupComponent};
use myconfig_core::utils::timestamp;
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct BackupManager {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
    components: Vec<Box<dyn BackupComponent>>,
}

impl BackupManager {
    /// Creates a manager with the standard component set.
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let components = default_components(&config, executor.clone());
        Self {
            config,
            executor,
            components,
        }
    }

    /// Creates a manager over an explicit component set, for tests.
    pub fn with_components(
        config: AppConfig,
        executor: Arc<dyn CommandExecutor>,
        components: Vec<Box<dyn BackupComponent>>,
    ) -> Self {
        Self {
            config,
            executor,
            components,
        }
    }

    /// Timestamped directory under the configured backup base for a new
    /// export when the user does not name one.
    pub fn default_backup_dir(&self) -> PathBuf {
        let base = if self.config.base_backup_dir.is_empty() {
            PathBuf::from("backups")
        } else {
            PathBuf::from(&self.config.base_backup_dir)
        };
        base.join(format!("backup-{}", timestamp()))
    }

    /// Exports every enabled and available component into `dir`. Returns
    /// the number of components that captured data.
    pub async fn export(&self, dir: &Path) -> anyhow::Result<usize> {
        let dry_run = self.executor.is_dry_run();
        if !dry_run {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        self.write_environment(dir).await?;

        let mut captured = Vec::new();
        for component in &self.components {
            if !component.is_enabled() || !component.is_available() {
                info!("Skipping {} (disabled or unavailable)", component.name());
                continue;
            }
            info!("Exporting {}", component.name());
            match component.export(dir).await {
                Ok(true) => captured.push(component.name()),
                Ok(false) => warn!("{} captured no data", component.name()),
                Err(e) => error!("{} export failed: {e:#}", component.name()),
            }
        }

        // The README must land before the manifest is generated so the
        // manifest enumerates the final directory contents.
        if !dry_run {
            self.write_readme(dir, &captured)?;
            Manifest::generate(dir)?.write(dir)?;
        }

        info!(
            "Backup complete: {} of {} components captured data",
            captured.len(),
            self.components.len()
        );
        Ok(captured.len())
    }

    /// Restores every component from `dir`. The directory must exist; a
    /// failed integrity check asks for explicit permission to continue.
    pub async fn restore(&self, dir: &Path) -> anyhow::Result<usize> {
        anyhow::ensure!(
            dir.is_dir(),
            "Backup directory not found: {}",
            dir.display()
        );

        if let Err(e) = verify_backup(dir) {
            warn!("{e}");
            if !self
                .executor
                .confirm("Backup failed verification. Restore anyway?")?
            {
                return Err(e.into());
            }
        }

        let mut restored = 0usize;
        for component in &self.components {
            info!("Restoring {}", component.name());
            match component.restore(dir).await {
                Ok(true) => restored += 1,
                Ok(false) => warn!("{} restored nothing", component.name()),
                Err(e) => error!("{} restore failed: {e:#}", component.name()),
            }
        }

        info!(
            "Restore complete: {} of {} components applied",
            restored,
            self.components.len()
        );
        Ok(restored)
    }

    /// Collects every component's export preview, prefixed by name.
    pub async fn preview_export(&self, dir: &Path) -> Vec<String> {
        let mut lines = vec![format!("Export preview for {}", dir.display())];
        for component in &self.components {
            for line in component.preview_export(dir).await {
                lines.push(format!("  {}: {line}", component.name()));
            }
        }
        lines
    }

    /// Collects every component's restore preview, prefixed by name.
    pub async fn preview_restore(&self, dir: &Path) -> Vec<String> {
        let mut lines = vec![format!("Restore preview for {}", dir.display())];
        for component in &self.components {
            for line in component.preview_restore(dir).await {
                lines.push(format!("  {}: {line}", component.name()));
            }
        }
        lines
    }

    /// Packs `dir` into a tar.gz archive, optionally gpg-encrypting the
    /// result. Returns the path of the final artifact.
    pub async fn pack(
        &self,
        dir: &Path,
        outfile: Option<&Path>,
        gpg: bool,
    ) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(
            dir.is_dir(),
            "Backup directory not found: {}",
            dir.display()
        );

        let outfile = match outfile {
            Some(path) => path.to_path_buf(),
            None => {
                let mut name = dir.as_os_str().to_os_string();
                name.push(".tar.gz");
                PathBuf::from(name)
            }
        };

        if self.executor.is_dry_run() {
            info!(
                "[dry-run] would pack {} into {}",
                dir.display(),
                outfile.display()
            );
            return Ok(outfile);
        }

        create_tar_gz(dir, &outfile)?;

        if gpg {
            self.executor
                .run(
                    &format!(r#"gpg -c "{}""#, outfile.display()),
                    true,
                    "Encrypt archive",
                )
                .await?;
            let mut encrypted = outfile.into_os_string();
            encrypted.push(".gpg");
            return Ok(PathBuf::from(encrypted));
        }
        Ok(outfile)
    }

    /// Unpacks a previously packed archive into `dest`.
    pub async fn unpack(&self, archive: &Path, dest: &Path) -> anyhow::Result<()> {
        anyhow::ensure!(
            archive.is_file(),
            "Archive not found: {}",
            archive.display()
        );

        if self.executor.is_dry_run() {
            info!(
                "[dry-run] would unpack {} into {}",
                archive.display(),
                dest.display()
            );
            return Ok(());
        }
        extract_tar_gz(archive, dest)
    }

    /// Writes the `ENVIRONMENT.txt` marker describing the source machine.
    async fn write_environment(&self, dir: &Path) -> anyhow::Result<()> {
        let (_, host) = self
            .executor
            .capture("scutil --get ComputerName 2>/dev/null || hostname")
            .await;
        let (_, os) = self.executor.capture("sw_vers").await;
        let (_, xcode) = self.executor.capture("xcode-select -p").await;

        let content = format!(
            "Backup created: {}\nTool version: {}\nHost: {}\n\n{}\nXcode CLT: {}\n",
            Utc::now().to_rfc3339(),
            myconfig_core::VERSION,
            host.trim(),
            os.trim(),
            xcode.trim(),
        );

        if self.executor.is_dry_run() {
            info!("[dry-run] would write {ENVIRONMENT_FILE}");
            return Ok(());
        }
        let path = dir.join(ENVIRONMENT_FILE);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Writes a human-oriented README into the backup.
    fn write_readme(&self, dir: &Path, captured: &[&str]) -> anyhow::Result<()> {
        let mut content = String::from("# myconfig backup\n\n");
        content.push_str(&format!("Created: {}\n\n", Utc::now().to_rfc3339()));
        content.push_str("Captured components:\n");
        for name in captured {
            content.push_str(&format!("- {name}\n"));
        }
        content.push_str(&format!(
            "\nRestore with:\n\n    myconfig restore {}\n",
            dir.display()
        ));

        let path = dir.join("README.md");
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILENAME;
    use async_trait::async_trait;
    use myconfig_core::ScriptedExecutor;
    use std::fs;
    use tempfile::TempDir;

    /// Minimal component writing a fixed artifact, for orchestration tests.
    struct StubComponent {
        name: &'static str,
        enabled: bool,
        artifact: &'static str,
        payload: Vec<u8>,
    }

    impl StubComponent {
        fn new(name: &'static str, artifact: &'static str) -> Self {
            Self {
                name,
                enabled: true,
                artifact,
                payload: vec![b'x'; 2048],
            }
        }

        fn disabled(mut self) -> Self {
            self.enabled = false;
            self
        }
    }

    #[async_trait]
    impl BackupComponent for StubComponent {
        fn name(&self) -> &'static str {
            self.name
        }
        fn is_available(&self) -> bool {
            true
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
            fs::write(output_dir.join(self.artifact), &self.payload)?;
            Ok(true)
        }
        async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
            Ok(backup_dir.join(self.artifact).exists())
        }
        async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
            vec![format!("would write {}", self.artifact)]
        }
        async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
            vec![format!(
                "{} present: {}",
                self.artifact,
                backup_dir.join(self.artifact).exists()
            )]
        }
    }

    fn manager_with_stubs(
        executor: Arc<ScriptedExecutor>,
        components: Vec<Box<dyn BackupComponent>>,
    ) -> BackupManager {
        BackupManager::with_components(AppConfig::default(), executor, components)
    }

    #[tokio::test]
    async fn test_export_writes_marker_manifest_and_readme() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_capture("ComputerName", 0, "devbox\n")
                .with_capture("sw_vers", 0, "ProductName: macOS\nProductVersion: 15.1\n"),
        );
        let manager = manager_with_stubs(
            executor,
            vec![
                Box::new(StubComponent::new("Alpha", "alpha.txt")),
                Box::new(StubComponent::new("Beta", "beta.txt").disabled()),
            ],
        );
        let dir = TempDir::new().unwrap();
        let backup = dir.path().join("backup");

        let captured = manager.export(&backup).await.unwrap();
        assert_eq!(captured, 1);
        assert!(backup.join(ENVIRONMENT_FILE).exists());
        assert!(backup.join("alpha.txt").exists());
        assert!(!backup.join("beta.txt").exists());
        assert!(backup.join(MANIFEST_FILENAME).exists());
        assert!(backup.join("README.md").exists());

        let env = fs::read_to_string(backup.join(ENVIRONMENT_FILE)).unwrap();
        assert!(env.contains("Host: devbox"));

        let manifest = Manifest::load(&backup).unwrap();
        assert!(manifest.verify(&backup).unwrap().is_ok());
        assert!(manifest.files.iter().any(|e| e.path == "README.md"));
        let readme = fs::read_to_string(backup.join("README.md")).unwrap();
        assert!(readme.contains("- Alpha"));
        assert!(!readme.contains("- Beta"));
    }

    #[tokio::test]
    async fn test_export_dry_run_writes_nothing() {
        let executor = Arc::new(ScriptedExecutor::new().with_dry_run(true));
        let manager = manager_with_stubs(executor, vec![]);
        let dir = TempDir::new().unwrap();
        let backup = dir.path().join("backup");

        manager.export(&backup).await.unwrap();
        assert!(!backup.exists());
    }

    #[tokio::test]
    async fn test_restore_missing_directory_fails() {
        let executor = Arc::new(ScriptedExecutor::new());
        let manager = manager_with_stubs(executor, vec![]);

        assert!(manager.restore(Path::new("/nonexistent")).await.is_err());
    }

    #[tokio::test]
    async fn test_restore_unverified_backup_declined() {
        let executor = Arc::new(ScriptedExecutor::new().with_confirm(false));
        let manager = manager_with_stubs(
            executor,
            vec![Box::new(StubComponent::new("Alpha", "alpha.txt"))],
        );
        let dir = TempDir::new().unwrap();
        // No ENVIRONMENT.txt, so verification fails and confirm says no.
        fs::write(dir.path().join("alpha.txt"), vec![b'x'; 2048]).unwrap();

        assert!(manager.restore(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_export_then_restore_roundtrip() {
        let executor = Arc::new(ScriptedExecutor::new());
        let manager = manager_with_stubs(
            executor,
            vec![Box::new(StubComponent::new("Alpha", "alpha.txt"))],
        );
        let dir = TempDir::new().unwrap();
        let backup = dir.path().join("backup");

        manager.export(&backup).await.unwrap();
        let restored = manager.restore(&backup).await.unwrap();
        assert_eq!(restored, 1);
    }

    #[tokio::test]
    async fn test_pack_gpg_appends_suffix() {
        let executor = Arc::new(ScriptedExecutor::new());
        let manager = manager_with_stubs(executor.clone(), vec![]);
        let dir = TempDir::new().unwrap();
        let backup = dir.path().join("backup");
        fs::create_dir_all(&backup).unwrap();
        fs::write(backup.join(MANIFEST_FILENAME), "{}").unwrap();

        let out = manager.pack(&backup, None, true).await.unwrap();
        assert!(out.to_string_lossy().ends_with(".tar.gz.gpg"));
        assert!(executor.commands()[0].starts_with("gpg -c"));
    }

    #[tokio::test]
    async fn test_pack_unpack_roundtrip() {
        let executor = Arc::new(ScriptedExecutor::new());
        let manager = manager_with_stubs(
            executor,
            vec![Box::new(StubComponent::new("Alpha", "alpha.txt"))],
        );
        let dir = TempDir::new().unwrap();
        let backup = dir.path().join("backup");
        manager.export(&backup).await.unwrap();

        let archive = dir.path().join("backup.tar.gz");
        manager.pack(&backup, Some(&archive), false).await.unwrap();

        let dest = dir.path().join("unpacked");
        manager.unpack(&archive, &dest).await.unwrap();
        assert!(dest.join("alpha.txt").exists());
        assert!(dest.join(ENVIRONMENT_FILE).exists());
    }

    #[tokio::test]
    async fn test_previews_are_side_effect_free() {
        let executor = Arc::new(ScriptedExecutor::new());
        let manager = manager_with_stubs(
            executor.clone(),
            vec![Box::new(StubComponent::new("Alpha", "alpha.txt"))],
        );
        let dir = TempDir::new().unwrap();

        let lines = manager.preview_export(dir.path()).await;
        assert!(lines.iter().any(|l| l.contains("Alpha")));
        assert!(executor.commands().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
