//! Command execution capability
//!
//! Every backup component shells out to system utilities (`brew`,
//! `defaults`, `mas`, `launchctl`, ...) through the [`CommandExecutor`]
//! trait rather than spawning processes directly. That keeps the components
//! testable against [`ScriptedExecutor`] and gives one place to implement
//! dry-run short-circuiting and confirmation prompts.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Narrow process-execution capability injected into every component.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Executes a shell command. In dry-run mode the command is logged and
    /// reported as successful without being spawned. When `check` is true a
    /// non-zero exit becomes an error; otherwise the exit code is returned
    /// for the caller to interpret.
    async fn run(&self, cmd: &str, check: bool, description: &str) -> Result<i32>;

    /// Executes a command and captures its stdout. Intended for read-only
    /// queries (`defaults domains`, `sw_vers`); runs even in dry-run mode,
    /// so callers that write the output to disk must gate the write on
    /// [`CommandExecutor::is_dry_run`] themselves.
    async fn capture(&self, cmd: &str) -> (i32, String);

    /// True if the named binary is resolvable on PATH. No side effects.
    fn binary_exists(&self, name: &str) -> bool;

    /// Asks the user for confirmation. Non-interactive runs auto-resolve
    /// to yes so automation still works.
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// True when commands are logged instead of executed.
    fn is_dry_run(&self) -> bool;
}

/// Production executor backed by `sh -c` via tokio.
pub struct SystemExecutor {
    config: AppConfig,
}

impl SystemExecutor {
    /// Creates an executor bound to the given run-time options.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// The configuration this executor was created with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn run(&self, cmd: &str, check: bool, description: &str) -> Result<i32> {
        if self.config.dry_run {
            if description.is_empty() {
                info!("[dry-run] {cmd}");
            } else {
                info!("[dry-run] ({description}) {cmd}");
            }
            return Ok(0);
        }

        if self.config.verbose {
            debug!("$ {cmd}");
        }

        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .status()
            .await
            .map_err(|e| Error::CommandSpawn {
                command: cmd.to_string(),
                source: e,
            })?;

        let code = status.code().unwrap_or(-1);
        if code != 0 {
            if check {
                return Err(Error::command_failed(cmd, code, description));
            }
            debug!("Command exited non-zero ({code}), tolerated: {cmd}");
        }
        Ok(code)
    }

    async fn capture(&self, cmd: &str) -> (i32, String) {
        if self.config.verbose {
            debug!("$ {cmd}");
        }

        match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .output()
            .await
        {
            Ok(output) => (
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stdout).into_owned(),
            ),
            Err(e) => {
                debug!("Command failed to spawn: {cmd}: {e}");
                (1, String::new())
            }
        }
    }

    fn binary_exists(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        if !self.config.interactive {
            debug!("Non-interactive run, auto-confirming: {prompt}");
            return Ok(true);
        }

        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| {
                warn!("Confirmation prompt failed: {e}");
                Error::Io(std::io::Error::other(e))
            })
    }

    fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }
}

/// Scripted executor for tests: records every command, spawns nothing, and
/// answers captures from a canned table matched by substring.
#[derive(Default)]
pub struct ScriptedExecutor {
    commands: Mutex<Vec<String>>,
    captures: Vec<(String, i32, String)>,
    binaries: HashSet<String>,
    fail_patterns: Vec<String>,
    confirm_answer: bool,
    dry_run: bool,
}

impl ScriptedExecutor {
    /// Creates a scripted executor that confirms everything and has no
    /// binaries on its fake PATH.
    pub fn new() -> Self {
        Self {
            confirm_answer: true,
            ..Self::default()
        }
    }

    /// Registers a binary as present on the fake PATH.
    pub fn with_binary(mut self, name: &str) -> Self {
        self.binaries.insert(name.to_string());
        self
    }

    /// Registers a canned capture: any command containing `pattern` yields
    /// the given exit code and stdout.
    pub fn with_capture(mut self, pattern: &str, code: i32, stdout: &str) -> Self {
        self.captures
            .push((pattern.to_string(), code, stdout.to_string()));
        self
    }

    /// Makes any command containing `pattern` exit with code 1.
    pub fn with_failure(mut self, pattern: &str) -> Self {
        self.fail_patterns.push(pattern.to_string());
        self
    }

    /// Sets the answer returned by `confirm`.
    pub fn with_confirm(mut self, answer: bool) -> Self {
        self.confirm_answer = answer;
        self
    }

    /// Marks the executor as dry-run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// All commands passed to `run` so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, cmd: &str, check: bool, description: &str) -> Result<i32> {
        self.commands.lock().unwrap().push(cmd.to_string());

        if self.dry_run {
            return Ok(0);
        }

        let failed = self.fail_patterns.iter().any(|p| cmd.contains(p.as_str()));
        let code = if failed { 1 } else { 0 };
        if failed && check {
            return Err(Error::command_failed(cmd, code, description));
        }
        Ok(code)
    }

    async fn capture(&self, cmd: &str) -> (i32, String) {
        for (pattern, code, stdout) in &self.captures {
            if cmd.contains(pattern.as_str()) {
                return (*code, stdout.clone());
            }
        }
        (1, String::new())
    }

    fn binary_exists(&self, name: &str) -> bool {
        self.binaries.contains(name)
    }

    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(self.confirm_answer)
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_short_circuits() {
        let executor = SystemExecutor::new(AppConfig::default().with_dry_run(true));
        // A command that would fail if actually executed
        let code = executor.run("exit 42", true, "").await.unwrap();
        assert_eq!(code, 0);
        assert!(executor.is_dry_run());
    }

    #[tokio::test]
    async fn test_run_checked_failure() {
        let executor = SystemExecutor::new(AppConfig::default());
        let err = executor.run("exit 3", true, "doomed").await.unwrap_err();
        match err {
            Error::CommandFailed { code, .. } => assert_eq!(code, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_unchecked_failure_tolerated() {
        let executor = SystemExecutor::new(AppConfig::default());
        let code = executor.run("exit 3", false, "").await.unwrap();
        assert_eq!(code, 3);
    }

    #[tokio::test]
    async fn test_capture_output() {
        let executor = SystemExecutor::new(AppConfig::default());
        let (code, out) = executor.capture("echo hello").await;
        assert_eq!(code, 0);
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_non_interactive_auto_confirms() {
        let executor = SystemExecutor::new(AppConfig::default().with_interactive(false));
        assert!(executor.confirm("Proceed?").unwrap());
    }

    #[tokio::test]
    async fn test_scripted_executor_records_and_fails() {
        let executor = ScriptedExecutor::new()
            .with_binary("brew")
            .with_failure("bundle")
            .with_capture("defaults domains", 0, "com.apple.dock com.apple.finder");

        assert!(executor.binary_exists("brew"));
        assert!(!executor.binary_exists("mas"));

        let code = executor.run("brew bundle install", false, "").await.unwrap();
        assert_eq!(code, 1);
        assert!(executor.run("brew bundle install", true, "").await.is_err());

        let (code, out) = executor.capture("defaults domains").await;
        assert_eq!(code, 0);
        assert!(out.contains("com.apple.dock"));

        assert_eq!(executor.commands().len(), 2);
    }
}
