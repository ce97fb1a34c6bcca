//! Sensitive-path filtering for dotfile backups
//!
//! A path is considered sensitive when its string form (case-insensitive)
//! contains any of a fixed set of substrings associated with private keys,
//! credentials, shell history, caches, or keychains. Callers pass the
//! home-relative path, never the absolute one, so the name of the home
//! directory (or anything above it) can never affect the verdict. The
//! predicate runs before a path is included in a backup, never after.
//!
//! This is advisory defense-in-depth, not a guarantee: substring matching
//! can both over-exclude (a directory literally named "secret-notes") and
//! under-exclude (a renamed private key). Content-based secret detection is
//! deliberately out of scope.

use std::path::Path;

/// Substrings that mark a path as sensitive.
pub const SENSITIVE_PATTERNS: &[&str] = &[
    // SSH material
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
    ".pem",
    ".key",
    ".p12",
    ".pfx",
    "known_hosts",
    "authorized_keys",
    // GPG material
    ".gnupg",
    "secring.gpg",
    "pubring.gpg",
    // Passwords and tokens
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "private_key",
    "credential",
    // Databases
    ".sqlite",
    // Shell history
    ".history",
    ".bash_history",
    ".zsh_history",
    // Caches and scratch space
    ".cache",
    ".tmp",
    // Application-specific credential stores
    ".aws/credentials",
    ".docker/config.json",
    "keychain",
];

/// Returns true if the home-relative path should be excluded from backups.
pub fn is_sensitive_path(path: &Path) -> bool {
    let lowered = path.to_string_lossy().to_lowercase();
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}
