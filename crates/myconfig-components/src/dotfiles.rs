//! Dotfile backup/restore
//!
//! A fixed catalog of home-relative dotfile paths is filtered through the
//! sensitive-path predicate, then archived in-process into
//! `dotfiles.tar.gz`. Directory entries are walked file by file so that a
//! sensitive file inside an otherwise safe directory (an `id_rsa` under
//! `~/.ssh`) is still excluded. Restore unpacks into a scratch directory
//! first and moves any file it would overwrite aside with a timestamped
//! `.bak` suffix.

use crate::security::is_sensitive_path;
use crate::BackupComponent;
use anyhow::Context;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use myconfig_core::utils::{expand_tilde, timestamp};
use myconfig_core::{AppConfig, CommandExecutor};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Component-owned artifact name.
pub const DOTFILES_ARCHIVE: &str = "dotfiles.tar.gz";

/// Home-relative paths worth carrying between machines. Directories are
/// walked recursively, entries containing `*` are glob-expanded, and
/// missing entries are skipped silently.
pub const DOTFILE_CATALOG: &[&str] = &[
    "~/.zshrc",
    "~/.zprofile",
    "~/.zshenv",
    "~/.bashrc",
    "~/.bash_profile",
    "~/.profile",
    "~/.gitconfig",
    "~/.gitignore_global",
    "~/.vimrc",
    "~/.vim",
    "~/.config/nvim",
    "~/.tmux.conf",
    "~/.oh-my-zsh/custom/*.zsh",
    "~/.ssh/config",
    "~/.config/karabiner",
    "~/.config/iterm2",
    "~/.config/wezterm",
    "~/.config/kitty",
    "~/.config/alacritty",
    "~/.config/starship.toml",
    "~/Library/Application Support/Code/User/settings.json",
    "~/Library/Application Support/Code/User/keybindings.json",
    "~/Library/Application Support/Code/User/snippets",
    "~/Library/Application Support/JetBrains/IntelliJIdea*",
    "~/Library/Preferences/com.googlecode.iterm2.plist",
    "~/Library/Developer/Xcode/UserData",
    "~/Library/Services",
    "~/Library/Fonts",
];

pub struct DotfilesComponent {
    #[allow(dead_code)]
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
    home: Option<PathBuf>,
}

impl DotfilesComponent {
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

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone().or_else(dirs::home_dir)
    }

    /// Catalog entries that exist and pass the sensitivity filter,
    /// as (absolute, home-relative) pairs. Glob entries are expanded
    /// first; directory entries are then expanded into their
    /// non-sensitive contained files.
    fn secure_catalog(&self, home: &Path) -> Vec<(PathBuf, PathBuf)> {
        let mut files = Vec::new();
        for pattern in DOTFILE_CATALOG {
            let abs = expand_tilde(pattern, home);
            if pattern.contains('*') {
                let Ok(matches) = glob::glob(&abs.to_string_lossy()) else {
                    continue;
                };
                for matched in matches.filter_map(|m| m.ok()) {
                    collect_path(&matched, home, &mut files);
                }
            } else {
                collect_path(&abs, home, &mut files);
            }
        }
        files
    }
}

#[async_trait]
impl BackupComponent for DotfilesComponent {
    fn name(&self) -> &'static str {
        "Dotfiles"
    }

    fn is_available(&self) -> bool {
        self.home_dir().is_some()
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn export(&self, output_dir: &Path) -> anyhow::Result<bool> {
        let Some(home) = self.home_dir() else {
            warn!("Home directory not resolvable, skipping dotfiles");
            return Ok(false);
        };

        let files = self.secure_catalog(&home);
        if files.is_empty() {
            warn!("No dotfiles found to back up");
            return Ok(false);
        }

        let archive_path = output_dir.join(DOTFILES_ARCHIVE);
        if self.executor.is_dry_run() {
            info!(
                "[dry-run] would archive {} dotfiles into {}",
                files.len(),
                archive_path.display()
            );
            return Ok(true);
        }

        // Write to a partial file first so an interrupted export never
        // leaves a truncated archive under the artifact name.
        let partial = output_dir.join(format!("{DOTFILES_ARCHIVE}.partial"));
        {
            let file = File::create(&partial)
                .with_context(|| format!("Failed to create {}", partial.display()))?;
            let encoder = GzEncoder::new(file, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            builder.follow_symlinks(false);
            for (abs, rel) in &files {
                builder
                    .append_path_with_name(abs, rel)
                    .with_context(|| format!("Failed to archive {}", abs.display()))?;
            }
            builder
                .into_inner()
                .and_then(|encoder| encoder.finish())
                .context("Failed to finish dotfiles archive")?;
        }
        fs::rename(&partial, &archive_path)
            .with_context(|| format!("Failed to finalize {}", archive_path.display()))?;

        info!("Archived {} dotfiles", files.len());
        Ok(true)
    }

    async fn restore(&self, backup_dir: &Path) -> anyhow::Result<bool> {
        let archive_path = backup_dir.join(DOTFILES_ARCHIVE);
        if !archive_path.exists() {
            warn!("No dotfiles archive found in backup");
            return Ok(false);
        }
        let Some(home) = self.home_dir() else {
            warn!("Home directory not resolvable, skipping dotfiles");
            return Ok(false);
        };

        if !self
            .executor
            .confirm("Restore dotfiles into your home directory?")?
        {
            return Ok(false);
        }

        if self.executor.is_dry_run() {
            info!(
                "[dry-run] would unpack {} into {}",
                archive_path.display(),
                home.display()
            );
            return Ok(true);
        }

        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let file = File::open(&archive_path)
            .with_context(|| format!("Failed to open {}", archive_path.display()))?;
        tar::Archive::new(GzDecoder::new(file))
            .unpack(scratch.path())
            .with_context(|| format!("Failed to unpack {}", archive_path.display()))?;

        let backup_suffix = format!("bak.{}", timestamp());
        let mut restored = 0usize;
        for entry in WalkDir::new(scratch.path()).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Ok(rel) = path.strip_prefix(scratch.path()) else {
                continue;
            };
            let dest = home.join(rel);
            if dest.exists() {
                let mut aside = dest.clone().into_os_string();
                aside.push(".");
                aside.push(&backup_suffix);
                let aside = PathBuf::from(aside);
                fs::rename(&dest, &aside)
                    .with_context(|| format!("Failed to back up {}", dest.display()))?;
                debug!("moved existing {} aside", dest.display());
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to restore {}", dest.display()))?;
            restored += 1;
        }

        info!("Restored {restored} dotfiles");
        Ok(restored > 0)
    }

    async fn preview_export(&self, _output_dir: &Path) -> Vec<String> {
        let Some(home) = self.home_dir() else {
            return vec!["✗ Home directory not resolvable".to_string()];
        };
        let files = self.secure_catalog(&home);
        if files.is_empty() {
            return vec!["✗ No dotfiles found".to_string()];
        }
        vec![format!("✓ Dotfiles: {} files (filtered)", files.len())]
    }

    async fn preview_restore(&self, backup_dir: &Path) -> Vec<String> {
        let archive_path = backup_dir.join(DOTFILES_ARCHIVE);
        if !archive_path.exists() {
            return vec!["✗ No dotfiles archive".to_string()];
        }
        match fs::metadata(&archive_path) {
            Ok(meta) => vec![format!(
                "✓ Dotfiles archive: {}",
                myconfig_core::utils::human_bytes(meta.len())
            )],
            Err(_) => vec!["✓ Dotfiles archive".to_string()],
        }
    }
}

/// Adds a file, or every non-sensitive file under a directory, to `files`
/// as (absolute, home-relative) pairs. The sensitivity predicate sees the
/// home-relative path only, so the home directory's own name never causes
/// an exclusion.
fn collect_path(abs: &Path, home: &Path, files: &mut Vec<(PathBuf, PathBuf)>) {
    if !abs.exists() {
        return;
    }
    if abs.is_dir() {
        for entry in WalkDir::new(abs).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() {
                push_file(path, home, files);
            }
        }
    } else {
        push_file(abs, home, files);
    }
}

fn push_file(abs: &Path, home: &Path, files: &mut Vec<(PathBuf, PathBuf)>) {
    let Ok(rel) = abs.strip_prefix(home) else {
        return;
    };
    if is_sensitive_path(rel) {
        debug!("excluding sensitive path: {}", rel.display());
        return;
    }
    files.push((abs.to_path_buf(), rel.to_path_buf()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use myconfig_core::ScriptedExecutor;
    use tempfile::TempDir;

    fn fake_home() -> TempDir {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join(".zshrc"), "export EDITOR=vim\n").unwrap();
        fs::create_dir_all(home.path().join(".ssh")).unwrap();
        fs::write(home.path().join(".ssh/config"), "Host github.com\n").unwrap();
        fs::write(home.path().join(".ssh/id_rsa"), "PRIVATE KEY\n").unwrap();
        fs::create_dir_all(home.path().join(".config/nvim")).unwrap();
        fs::write(home.path().join(".config/nvim/init.lua"), "-- nvim\n").unwrap();
        fs::create_dir_all(home.path().join(".oh-my-zsh/custom")).unwrap();
        fs::write(home.path().join(".oh-my-zsh/custom/aliases.zsh"), "alias ll='ls -l'\n").unwrap();
        fs::write(home.path().join(".oh-my-zsh/custom/notes.md"), "not zsh\n").unwrap();
        home
    }

    fn component(home: &TempDir, executor: Arc<ScriptedExecutor>) -> DotfilesComponent {
        DotfilesComponent::new(AppConfig::default(), executor).with_home(home.path().to_path_buf())
    }

    fn archive_entries(path: &Path) -> Vec<String> {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_export_filters_sensitive_files() {
        let home = fake_home();
        let executor = Arc::new(ScriptedExecutor::new());
        let component = component(&home, executor);
        let out = TempDir::new().unwrap();

        assert!(component.export(out.path()).await.unwrap());
        let entries = archive_entries(&out.path().join(DOTFILES_ARCHIVE));
        assert!(entries.iter().any(|e| e.ends_with(".zshrc")));
        assert!(entries.iter().any(|e| e.ends_with(".ssh/config")));
        assert!(entries.iter().any(|e| e.ends_with("init.lua")));
        assert!(!entries.iter().any(|e| e.contains("id_rsa")));
    }

    #[tokio::test]
    async fn test_filter_ignores_home_directory_name() {
        // A home path that itself matches a sensitive pattern must not
        // exclude ordinary files beneath it.
        let parent = TempDir::new().unwrap();
        let home = parent.path().join("dev.cache-box");
        fs::create_dir_all(&home).unwrap();
        fs::write(home.join(".zshrc"), "export EDITOR=vim\n").unwrap();

        let executor = Arc::new(ScriptedExecutor::new());
        let component =
            DotfilesComponent::new(AppConfig::default(), executor).with_home(home.clone());
        let out = TempDir::new().unwrap();

        assert!(component.export(out.path()).await.unwrap());
        let entries = archive_entries(&out.path().join(DOTFILES_ARCHIVE));
        assert!(entries.iter().any(|e| e.ends_with(".zshrc")));
    }

    #[tokio::test]
    async fn test_export_expands_glob_entries() {
        let home = fake_home();
        let executor = Arc::new(ScriptedExecutor::new());
        let component = component(&home, executor);
        let out = TempDir::new().unwrap();

        assert!(component.export(out.path()).await.unwrap());
        let entries = archive_entries(&out.path().join(DOTFILES_ARCHIVE));
        assert!(entries.iter().any(|e| e.ends_with("aliases.zsh")));
        assert!(!entries.iter().any(|e| e.ends_with("notes.md")));
    }

    #[tokio::test]
    async fn test_export_dry_run_writes_nothing() {
        let home = fake_home();
        let executor = Arc::new(ScriptedExecutor::new().with_dry_run(true));
        let component = component(&home, executor);
        let out = TempDir::new().unwrap();

        assert!(component.export(out.path()).await.unwrap());
        assert!(!out.path().join(DOTFILES_ARCHIVE).exists());
    }

    #[tokio::test]
    async fn test_restore_backs_up_existing_files() {
        let home = fake_home();
        let executor = Arc::new(ScriptedExecutor::new());
        let out = TempDir::new().unwrap();
        component(&home, executor.clone())
            .export(out.path())
            .await
            .unwrap();

        let target = TempDir::new().unwrap();
        fs::write(target.path().join(".zshrc"), "old content\n").unwrap();
        let restorer = DotfilesComponent::new(AppConfig::default(), executor)
            .with_home(target.path().to_path_buf());
        assert!(restorer.restore(out.path()).await.unwrap());

        let restored = fs::read_to_string(target.path().join(".zshrc")).unwrap();
        assert_eq!(restored, "export EDITOR=vim\n");
        let aside: Vec<_> = fs::read_dir(target.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("bak."))
            .collect();
        assert_eq!(aside.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_declined() {
        let home = fake_home();
        let executor = Arc::new(ScriptedExecutor::new());
        let out = TempDir::new().unwrap();
        component(&home, executor.clone())
            .export(out.path())
            .await
            .unwrap();

        let target = TempDir::new().unwrap();
        let declined = Arc::new(ScriptedExecutor::new().with_confirm(false));
        let restorer = DotfilesComponent::new(AppConfig::default(), declined)
            .with_home(target.path().to_path_buf());
        assert!(!restorer.restore(out.path()).await.unwrap());
        assert!(!target.path().join(".zshrc").exists());
    }

    #[tokio::test]
    async fn test_restore_missing_archive() {
        let home = fake_home();
        let executor = Arc::new(ScriptedExecutor::new());
        let component = component(&home, executor);
        let out = TempDir::new().unwrap();

        assert!(!component.restore(out.path()).await.unwrap());
    }
}
