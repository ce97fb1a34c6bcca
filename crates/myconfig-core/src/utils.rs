//! Small shared utilities

use std::path::Path;

/// Timestamp used in backup directory names and backup-aside suffixes.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Reads a plain-text list file: one entry per line, blank lines and
/// `#`-prefixed comments ignored. A missing file yields an empty list.
pub fn read_list_file(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Formats bytes as a human-readable string.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(pattern: &str, home: &Path) -> std::path::PathBuf {
    if let Some(rest) = pattern.strip_prefix("~/") {
        home.join(rest)
    } else if pattern == "~" {
        home.to_path_buf()
    } else {
        std::path::PathBuf::from(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        // %Y%m%d-%H%M%S
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.chars().nth(8), Some('-'));
    }

    #[test]
    fn test_read_list_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("domains.txt");
        fs::write(&path, "com.apple.dock\n# comment\n\n  com.apple.finder  \n").unwrap();

        let entries = read_list_file(&path);
        assert_eq!(entries, vec!["com.apple.dock", "com.apple.finder"]);
    }

    #[test]
    fn test_read_list_file_missing() {
        assert!(read_list_file(Path::new("/nonexistent/list.txt")).is_empty());
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1024), "1.00 KB");
        assert_eq!(human_bytes(1_048_576), "1.00 MB");
    }

    #[test]
    fn test_expand_tilde() {
        let home = PathBuf::from("/Users/dev");
        assert_eq!(
            expand_tilde("~/.zshrc", &home),
            PathBuf::from("/Users/dev/.zshrc")
        );
        assert_eq!(expand_tilde("~", &home), home);
        assert_eq!(
            expand_tilde("/etc/hosts", &home),
            PathBuf::from("/etc/hosts")
        );
    }
}
