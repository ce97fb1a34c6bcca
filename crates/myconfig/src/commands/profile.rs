//! Profile command - named configuration profiles
//!
//! A profile is a saved copy of the config file under
//! `config/profiles/<name>.toml`. `use` replaces the active config with a
//! profile; `save` captures the active config under a name.

use crate::cli::{Cli, ProfileCommands};
use crate::output;
use anyhow::{Context, Result};
use myconfig_core::DEFAULT_CONFIG_PATH;
use std::fs;
use std::path::{Path, PathBuf};

const PROFILES_DIR: &str = "config/profiles";

pub fn run(args: &ProfileCommands, cli: &Cli) -> Result<()> {
    let active: PathBuf = match &cli.config {
        Some(path) => path.as_std_path().to_path_buf(),
        None => PathBuf::from(DEFAULT_CONFIG_PATH),
    };

    match args {
        ProfileCommands::List => list(),
        ProfileCommands::Use { name } => use_profile(name, &active),
        ProfileCommands::Save { name } => save_profile(name, &active),
    }
}

fn list() -> Result<()> {
    output::header("Saved profiles");
    let mut names: Vec<String> = match fs::read_dir(PROFILES_DIR) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();

    if names.is_empty() {
        output::info("No profiles saved yet (use `myconfig profile save <name>`)");
        return Ok(());
    }
    for name in names {
        println!("  {name}");
    }
    Ok(())
}

fn use_profile(name: &str, active: &Path) -> Result<()> {
    let profile = profile_path(name);
    anyhow::ensure!(profile.is_file(), "No such profile: {name}");

    if let Some(parent) = active.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(&profile, active)
        .with_context(|| format!("Failed to activate profile {name}"))?;
    output::success(&format!("Now using profile {name}"));
    Ok(())
}

fn save_profile(name: &str, active: &Path) -> Result<()> {
    anyhow::ensure!(
        active.is_file(),
        "No active config at {} to save",
        active.display()
    );

    fs::create_dir_all(PROFILES_DIR)
        .with_context(|| format!("Failed to create {PROFILES_DIR}"))?;
    let profile = profile_path(name);
    fs::copy(active, &profile)
        .with_context(|| format!("Failed to save profile {name}"))?;
    output::success(&format!("Saved profile {name}"));
    Ok(())
}

fn profile_path(name: &str) -> PathBuf {
    Path::new(PROFILES_DIR).join(format!("{name}.toml"))
}
