//! Configuration file loading and parsing
//!
//! The configuration file is TOML with flat keys. Values may be real TOML
//! booleans or the strings `"true"`/`"false"`; both are accepted. A file
//! that fails TOML parsing is re-read with a degenerate line-oriented
//! `key = value` parser so hand-edited configs still load. A missing file
//! yields built-in defaults. Unknown keys are ignored.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default location of the configuration file, relative to the working dir.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Immutable snapshot of run-time options.
///
/// Created once at startup and never mutated; [`AppConfig::with`] style
/// updates produce a new instance. Consumed by every backup component and
/// by the command executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Whether confirmation prompts are shown (false auto-answers yes)
    pub interactive: bool,

    /// Log commands instead of executing them
    pub dry_run: bool,

    /// Verbose command echoing
    pub verbose: bool,

    /// Suppress non-error output
    pub quiet: bool,

    /// Export/restore the Mac App Store app list
    pub enable_mas: bool,

    /// Export/restore the VS Code extension list
    pub enable_vscode: bool,

    /// Export/restore `defaults` preference domains
    pub enable_defaults: bool,

    /// Export/restore user LaunchAgents
    pub enable_launchagents: bool,

    /// Export/restore npm global packages
    pub enable_npm: bool,

    /// Export/restore pip user packages
    pub enable_pip_user: bool,

    /// Export/restore pipx-managed packages
    pub enable_pipx: bool,

    /// Base directory for generated backups ("" means ./backups)
    pub base_backup_dir: String,

    /// Allow-list of `defaults` domains to export, one per line
    pub defaults_domains_file: String,

    /// Exclude-list applied by the full-domain-dump variant
    pub defaults_exclude_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interactive: true,
            dry_run: false,
            verbose: false,
            quiet: false,
            enable_mas: true,
            enable_vscode: true,
            enable_defaults: true,
            enable_launchagents: true,
            enable_npm: false,
            enable_pip_user: false,
            enable_pipx: false,
            base_backup_dir: String::new(),
            defaults_domains_file: "config/defaults/domains.txt".to_string(),
            defaults_exclude_file: "config/defaults/exclude.txt".to_string(),
        }
    }
}

impl AppConfig {
    /// Returns a copy with the interactivity flag replaced.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Returns a copy with the dry-run flag replaced.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns a copy with the verbose flag replaced.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns a copy with the quiet flag replaced.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Returns a copy with MAS handling replaced.
    pub fn with_enable_mas(mut self, enable_mas: bool) -> Self {
        self.enable_mas = enable_mas;
        self
    }
}

/// Loads, validates and updates [`AppConfig`] instances.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the given config file path.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Creates a manager pointing at the default config location.
    pub fn default_location() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }

    /// Path this manager reads from.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the configuration, falling back to defaults when the file is
    /// missing and to the line-oriented parser when TOML parsing fails.
    pub fn load(&self) -> Result<AppConfig> {
        let values = self.parse_values()?;

        let get_bool = |key: &str, default: bool| -> bool {
            match values.get(key) {
                Some(v) => v.trim().eq_ignore_ascii_case("true"),
                None => default,
            }
        };
        let get_str = |key: &str, default: &str| -> String {
            values
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let defaults = AppConfig::default();
        Ok(AppConfig {
            interactive: get_bool("interactive", defaults.interactive),
            dry_run: defaults.dry_run,
            verbose: defaults.verbose,
            quiet: defaults.quiet,
            enable_mas: get_bool("enable_mas", defaults.enable_mas),
            enable_vscode: get_bool("enable_vscode", defaults.enable_vscode),
            enable_defaults: get_bool("enable_defaults", defaults.enable_defaults),
            enable_launchagents: get_bool("enable_launchagents", defaults.enable_launchagents),
            enable_npm: get_bool("enable_npm", defaults.enable_npm),
            enable_pip_user: get_bool("enable_pip_user", defaults.enable_pip_user),
            enable_pipx: get_bool("enable_pipx", defaults.enable_pipx),
            base_backup_dir: get_str("base_backup_dir", &defaults.base_backup_dir),
            defaults_domains_file: get_str(
                "defaults_domains_file",
                &defaults.defaults_domains_file,
            ),
            defaults_exclude_file: get_str(
                "defaults_exclude_file",
                &defaults.defaults_exclude_file,
            ),
        })
    }

    /// Parses the config file into a flat string map.
    fn parse_values(&self) -> Result<BTreeMap<String, String>> {
        if !self.config_path.exists() {
            warn!(
                "Config file not found: {}, using defaults",
                self.config_path.display()
            );
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.config_path)?;

        match content.parse::<toml::Table>() {
            Ok(table) => Ok(flatten_toml(&table)),
            Err(e) => {
                warn!("Failed to parse TOML config: {e}, using fallback parser");
                Ok(fallback_parse(&content))
            }
        }
    }
}

/// Converts top-level TOML values to strings; booleans become "true"/"false".
fn flatten_toml(table: &toml::Table) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for (key, value) in table {
        let text = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            other => {
                debug!("Ignoring non-scalar config key: {key} = {other}");
                continue;
            }
        };
        values.insert(key.clone(), text);
    }
    values
}

/// Degenerate `key = value` parser for configs that are not valid TOML.
fn fallback_parse(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        values.insert(key.trim().to_string(), value.to_string());
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ConfigManager::new("/nonexistent/config.toml").load().unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.interactive);
        assert!(config.enable_mas);
        assert!(!config.enable_npm);
    }

    #[test]
    fn test_load_toml_booleans() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "interactive = false\nenable_mas = false\n");
        let config = ConfigManager::new(path).load().unwrap();
        assert!(!config.interactive);
        assert!(!config.enable_mas);
        assert!(config.enable_vscode);
    }

    #[test]
    fn test_load_stringly_booleans() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "enable_npm = \"true\"\nenable_vscode = \"false\"\n");
        let config = ConfigManager::new(path).load().unwrap();
        assert!(config.enable_npm);
        assert!(!config.enable_vscode);
    }

    #[test]
    fn test_load_paths() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "base_backup_dir = \"/tmp/backups\"\ndefaults_domains_file = \"custom/domains.txt\"\n",
        );
        let config = ConfigManager::new(path).load().unwrap();
        assert_eq!(config.base_backup_dir, "/tmp/backups");
        assert_eq!(config.defaults_domains_file, "custom/domains.txt");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "mystery_knob = 42\nenable_mas = true\n");
        let config = ConfigManager::new(path).load().unwrap();
        assert!(config.enable_mas);
    }

    #[test]
    fn test_fallback_parser_on_invalid_toml() {
        let dir = TempDir::new().unwrap();
        // Unbalanced bracket is invalid TOML but fine for the fallback
        let path = write_config(
            &dir,
            "[broken\ninteractive = false\n# comment\nenable_pipx = 'true'\n",
        );
        let config = ConfigManager::new(path).load().unwrap();
        assert!(!config.interactive);
        assert!(config.enable_pipx);
    }

    #[test]
    fn test_copy_on_write_updates() {
        let base = AppConfig::default();
        let updated = base.clone().with_dry_run(true).with_enable_mas(false);
        assert!(updated.dry_run);
        assert!(!updated.enable_mas);
        // original untouched
        assert!(!base.dry_run);
        assert!(base.enable_mas);
    }
}
