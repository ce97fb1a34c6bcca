//! Error types for myconfig-core

use thiserror::Error;

/// Result type alias using myconfig-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for MyConfig
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be parsed in either format
    #[error("Invalid configuration file {path}: {message}")]
    InvalidConfig { path: String, message: String },

    /// A shelled-out command exited non-zero and the caller required success
    #[error("Command failed{}: exit code {code}: {command}", description_suffix(.description))]
    CommandFailed {
        command: String,
        code: i32,
        description: String,
    },

    /// A shelled-out command could not be spawned at all
    #[error("Failed to spawn command: {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Backup directory failed the integrity check
    #[error("Backup integrity check failed: {reason}")]
    IntegrityFailure { reason: String },

    /// Archive is missing its manifest or is otherwise unreadable
    #[error("Invalid backup archive {path}: {reason}")]
    InvalidArchive { path: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn description_suffix(description: &str) -> String {
    if description.is_empty() {
        String::new()
    } else {
        format!(" ({description})")
    }
}

impl Error {
    /// Create an invalid config error
    pub fn invalid_config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a command failed error
    pub fn command_failed(
        command: impl Into<String>,
        code: i32,
        description: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            code,
            description: description.into(),
        }
    }

    /// Create an integrity failure error
    pub fn integrity_failure(reason: impl Into<String>) -> Self {
        Self::IntegrityFailure {
            reason: reason.into(),
        }
    }

    /// Create an invalid archive error
    pub fn invalid_archive(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArchive {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_with_description() {
        let err = Error::command_failed("brew bundle", 1, "Install packages");
        assert_eq!(
            err.to_string(),
            "Command failed (Install packages): exit code 1: brew bundle"
        );
    }

    #[test]
    fn test_command_failed_without_description() {
        let err = Error::command_failed("mas list", 2, "");
        assert_eq!(err.to_string(), "Command failed: exit code 2: mas list");
    }

    #[test]
    fn test_integrity_failure_display() {
        let err = Error::integrity_failure("missing ENVIRONMENT.txt");
        assert!(err.to_string().contains("missing ENVIRONMENT.txt"));
    }
}
