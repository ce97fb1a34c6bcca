//! Cheap structural integrity checks for backup directories
//!
//! A usable backup always contains the `ENVIRONMENT.txt` marker written at
//! the start of an export, and is never smaller than 1KB (an empty or
//! interrupted export produces less). These checks are deliberately cheap;
//! the manifest comparison in [`crate::manifest`] is the thorough one.

use myconfig_core::Error;
use std::path::Path;
use walkdir::WalkDir;

/// Environment marker written first during export.
pub const ENVIRONMENT_FILE: &str = "ENVIRONMENT.txt";

/// A backup smaller than this is considered empty or truncated.
pub const MIN_BACKUP_BYTES: u64 = 1024;

/// Checks that `dir` looks like a complete backup: it exists, carries the
/// environment marker, and holds at least [`MIN_BACKUP_BYTES`] of data.
pub fn verify_backup(dir: &Path) -> Result<(), Error> {
    if !dir.is_dir() {
        return Err(Error::integrity_failure(format!(
            "backup directory not found: {}",
            dir.display()
        )));
    }
    if !dir.join(ENVIRONMENT_FILE).is_file() {
        return Err(Error::integrity_failure(format!(
            "missing {ENVIRONMENT_FILE} marker"
        )));
    }

    let total: u64 = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum();
    if total < MIN_BACKUP_BYTES {
        return Err(Error::integrity_failure(format!(
            "backup too small ({total} bytes, expected at least {MIN_BACKUP_BYTES})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory() {
        let err = verify_backup(Path::new("/nonexistent/backup")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_missing_environment_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Brewfile"), vec![b'x'; 2048]).unwrap();

        let err = verify_backup(dir.path()).unwrap_err();
        assert!(err.to_string().contains("ENVIRONMENT.txt"));
    }

    #[test]
    fn test_too_small() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ENVIRONMENT_FILE), "host\n").unwrap();

        let err = verify_backup(dir.path()).unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn test_valid_backup() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ENVIRONMENT_FILE), "host\n").unwrap();
        fs::write(dir.path().join("Brewfile"), vec![b'x'; 2048]).unwrap();

        assert!(verify_backup(dir.path()).is_ok());
    }
}
