//! Environment health checks
//!
//! `myconfig doctor` runs a fixed battery of read-only checks against the
//! machine: developer tooling present, package managers functional, App
//! Store signed in, and the configured `defaults` domains actually
//! registered. Checks never mutate anything; every probe goes through the
//! [`CommandExecutor`] capture path.

use myconfig_core::utils::read_list_file;
use myconfig_core::{AppConfig, CommandExecutor};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            detail: detail.into(),
        }
    }

    fn warn(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Warn,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            detail: detail.into(),
        }
    }
}

pub struct Doctor {
    config: AppConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl Doctor {
    pub fn new(config: AppConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { config, executor }
    }

    /// Runs every check and returns the results in display order.
    pub async fn run_all(&self) -> Vec<CheckResult> {
        vec![
            self.check_xcode_clt().await,
            self.check_homebrew().await,
            self.check_vscode().await,
            self.check_mas().await,
            self.check_defaults_domains().await,
        ]
    }

    /// True when no check failed outright.
    pub fn healthy(results: &[CheckResult]) -> bool {
        results.iter().all(|r| r.status != CheckStatus::Fail)
    }

    async fn check_xcode_clt(&self) -> CheckResult {
        let (code, path) = self.executor.capture("xcode-select -p").await;
        if code == 0 {
            CheckResult::pass("Xcode command line tools", path.trim().to_string())
        } else {
            CheckResult::fail(
                "Xcode command line tools",
                "not installed; run `xcode-select --install`",
            )
        }
    }

    async fn check_homebrew(&self) -> CheckResult {
        if !self.executor.binary_exists("brew") {
            return CheckResult::fail("Homebrew", "brew not on PATH");
        }
        let (code, version) = self.executor.capture("brew --version").await;
        if code != 0 {
            return CheckResult::fail("Homebrew", "brew exists but does not run");
        }
        let version = version.lines().next().unwrap_or("").to_string();

        // `brew doctor` exits non-zero for advisories too, so treat it as
        // a warning rather than a failure.
        let (doctor_code, _) = self.executor.capture("brew doctor 2>&1").await;
        if doctor_code != 0 {
            return CheckResult::warn("Homebrew", format!("{version}; `brew doctor` has advisories"));
        }
        CheckResult::pass("Homebrew", version)
    }

    async fn check_vscode(&self) -> CheckResult {
        if !self.config.enable_vscode {
            return CheckResult::pass("VS Code", "disabled in config");
        }
        if self.executor.binary_exists("code") {
            CheckResult::pass("VS Code", "`code` CLI on PATH")
        } else {
            CheckResult::warn(
                "VS Code",
                "`code` CLI not found; install it from the VS Code command palette",
            )
        }
    }

    async fn check_mas(&self) -> CheckResult {
        if !self.config.enable_mas {
            return CheckResult::pass("Mac App Store", "disabled in config");
        }
        if !self.executor.binary_exists("mas") {
            return CheckResult::warn("Mac App Store", "mas not installed (`brew install mas`)");
        }
        let (code, account) = self.executor.capture("mas account").await;
        if code == 0 && !account.trim().is_empty() {
            CheckResult::pass("Mac App Store", format!("signed in as {}", account.trim()))
        } else {
            CheckResult::warn("Mac App Store", "not signed in; restores will fail")
        }
    }

    async fn check_defaults_domains(&self) -> CheckResult {
        let wanted = read_list_file(Path::new(&self.config.defaults_domains_file));
        if wanted.is_empty() {
            return CheckResult::warn(
                "Defaults domains",
                format!("no domains listed in {}", self.config.defaults_domains_file),
            );
        }

        let (code, output) = self.executor.capture("defaults domains").await;
        if code != 0 {
            return CheckResult::fail("Defaults domains", "`defaults domains` failed");
        }
        let registered: Vec<&str> = output.split(',').map(str::trim).collect();
        let missing: Vec<&String> = wanted
            .iter()
            .filter(|d| *d != "NSGlobalDomain" && !registered.contains(&d.as_str()))
            .collect();

        if missing.is_empty() {
            CheckResult::pass(
                "Defaults domains",
                format!("all {} listed domains registered", wanted.len()),
            )
        } else {
            CheckResult::warn(
                "Defaults domains",
                format!(
                    "{} of {} listed domains not registered",
                    missing.len(),
                    wanted.len()
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myconfig_core::ScriptedExecutor;
    use std::fs;
    use tempfile::TempDir;

    fn result_for<'a>(results: &'a [CheckResult], name: &str) -> &'a CheckResult {
        results.iter().find(|r| r.name == name).unwrap()
    }

    #[tokio::test]
    async fn test_healthy_machine() {
        let dir = TempDir::new().unwrap();
        let domains_file = dir.path().join("domains.txt");
        fs::write(&domains_file, "com.apple.dock\n").unwrap();
        let mut config = AppConfig::default();
        config.defaults_domains_file = domains_file.to_string_lossy().into_owned();

        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_binary("brew")
                .with_binary("code")
                .with_binary("mas")
                .with_capture("xcode-select", 0, "/Library/Developer/CommandLineTools\n")
                .with_capture("brew --version", 0, "Homebrew 4.4.0\n")
                .with_capture("brew doctor", 0, "Your system is ready to brew.\n")
                .with_capture("mas account", 0, "dev@example.com\n")
                .with_capture("defaults domains", 0, "com.apple.dock, com.apple.finder"),
        );
        let results = Doctor::new(config, executor).run_all().await;

        assert!(Doctor::healthy(&results));
        assert!(results.iter().all(|r| r.status == CheckStatus::Pass));
    }

    #[tokio::test]
    async fn test_missing_xcode_fails() {
        let executor = Arc::new(ScriptedExecutor::new());
        let results = Doctor::new(AppConfig::default(), executor).run_all().await;

        let xcode = result_for(&results, "Xcode command line tools");
        assert_eq!(xcode.status, CheckStatus::Fail);
        assert!(!Doctor::healthy(&results));
    }

    #[tokio::test]
    async fn test_mas_not_signed_in_warns() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_binary("mas")
                .with_capture("mas account", 1, ""),
        );
        let doctor = Doctor::new(AppConfig::default(), executor);
        let result = doctor.check_mas().await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn test_disabled_components_pass() {
        let config = AppConfig {
            enable_mas: false,
            enable_vscode: false,
            ..AppConfig::default()
        };
        let doctor = Doctor::new(config, Arc::new(ScriptedExecutor::new()));
        assert_eq!(doctor.check_mas().await.status, CheckStatus::Pass);
        assert_eq!(doctor.check_vscode().await.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn test_unregistered_domains_warn() {
        let dir = TempDir::new().unwrap();
        let domains_file = dir.path().join("domains.txt");
        fs::write(&domains_file, "com.apple.dock\ncom.example.ghost\n").unwrap();
        let mut config = AppConfig::default();
        config.defaults_domains_file = domains_file.to_string_lossy().into_owned();

        let executor = Arc::new(
            ScriptedExecutor::new().with_capture("defaults domains", 0, "com.apple.dock"),
        );
        let doctor = Doctor::new(config, executor);
        let result = doctor.check_defaults_domains().await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.detail.contains("1 of 2"));
    }
}
