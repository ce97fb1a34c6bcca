//! Backup manifest generation and verification
//!
//! `MANIFEST.json` records every file in a backup directory (relative path
//! and byte size), excluding the manifest itself. Verification re-walks the
//! directory and compares path sets, reporting files that disappeared and
//! files that were added after the manifest was written.

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

/// Manifest file name at the backup root.
pub const MANIFEST_FILENAME: &str = "MANIFEST.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the backup root, `/`-separated.
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// RFC 3339 creation time.
    pub created_at: String,
    pub tool_version: String,
    pub total_size: u64,
    pub files: Vec<ManifestEntry>,
}

/// Outcome of checking a directory against its manifest.
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Listed in the manifest but absent on disk.
    pub missing: Vec<String>,
    /// Present on disk but not listed.
    pub unexpected: Vec<String>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

impl Manifest {
    /// Walks `dir` and records every file except the manifest itself,
    /// sorted by path for stable output.
    pub fn generate(dir: &Path) -> anyhow::Result<Self> {
        let mut files = Vec::new();
        let mut total_size = 0u64;
        for (path, size) in walk_files(dir)? {
            files.push(ManifestEntry { path, size });
            total_size += size;
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(Self {
            created_at: Utc::now().to_rfc3339(),
            tool_version: myconfig_core::VERSION.to_string(),
            total_size,
            files,
        })
    }

    /// Writes the manifest into `dir` as pretty-printed JSON.
    pub fn write(&self, dir: &Path) -> anyhow::Result<()> {
        let path = dir.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Loads the manifest from `dir`.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join(MANIFEST_FILENAME);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Re-walks `dir` and compares its file set against this manifest.
    pub fn verify(&self, dir: &Path) -> anyhow::Result<VerifyReport> {
        let on_disk: BTreeSet<String> =
            walk_files(dir)?.into_iter().map(|(path, _)| path).collect();
        let listed: BTreeSet<String> = self.files.iter().map(|e| e.path.clone()).collect();

        Ok(VerifyReport {
            missing: listed.difference(&on_disk).cloned().collect(),
            unexpected: on_disk.difference(&listed).cloned().collect(),
        })
    }
}

/// All files under `dir` except the manifest, as (relative path, size).
fn walk_files(dir: &Path) -> anyhow::Result<Vec<(String, u64)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if rel == MANIFEST_FILENAME {
            continue;
        }
        files.push((rel, entry.metadata()?.len()));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn seed_backup(dir: &Path) {
        fs::write(dir.join("Brewfile"), "brew \"jq\"\n").unwrap();
        fs::create_dir_all(dir.join("defaults")).unwrap();
        fs::write(dir.join("defaults/com.apple.dock.plist"), b"plist").unwrap();
    }

    #[test]
    fn test_generate_excludes_manifest_itself() {
        let dir = TempDir::new().unwrap();
        seed_backup(dir.path());
        fs::write(dir.path().join(MANIFEST_FILENAME), "{}").unwrap();

        let manifest = Manifest::generate(dir.path()).unwrap();
        let paths: Vec<&str> = manifest.files.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["Brewfile", "defaults/com.apple.dock.plist"]);
        assert_eq!(manifest.total_size, 10 + 5);
    }

    #[test]
    fn test_write_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        seed_backup(dir.path());

        let manifest = Manifest::generate(dir.path()).unwrap();
        manifest.write(dir.path()).unwrap();
        let loaded = Manifest::load(dir.path()).unwrap();
        assert_eq!(loaded.files, manifest.files);
        assert_eq!(loaded.total_size, manifest.total_size);
    }

    #[test]
    fn test_verify_clean_directory() {
        let dir = TempDir::new().unwrap();
        seed_backup(dir.path());
        let manifest = Manifest::generate(dir.path()).unwrap();
        manifest.write(dir.path()).unwrap();

        let report = manifest.verify(dir.path()).unwrap();
        assert!(report.is_ok());
    }

    #[test]
    fn test_verify_detects_missing_and_unexpected() {
        let dir = TempDir::new().unwrap();
        seed_backup(dir.path());
        let manifest = Manifest::generate(dir.path()).unwrap();

        fs::remove_file(dir.path().join("Brewfile")).unwrap();
        fs::write(dir.path().join("stray.log"), "oops").unwrap();

        let report = manifest.verify(dir.path()).unwrap();
        assert_eq!(report.missing, vec!["Brewfile"]);
        assert_eq!(report.unexpected, vec!["stray.log"]);
    }
}
