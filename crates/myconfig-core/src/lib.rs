//! MyConfig core library
//!
//! Shared foundations for the MyConfig CLI: the immutable [`AppConfig`]
//! run-time options, TOML configuration loading with a degenerate
//! `key = value` fallback, the [`CommandExecutor`] capability that every
//! backup component shells out through, and small utilities (timestamps,
//! list-file parsing, byte formatting).

pub mod config;
pub mod error;
pub mod executor;
pub mod utils;

pub use config::{AppConfig, ConfigManager, DEFAULT_CONFIG_PATH};
pub use error::{Error, Result};
pub use executor::{CommandExecutor, ScriptedExecutor, SystemExecutor};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
