//! Backup orchestration, manifest and archive handling
//!
//! Ties the component set from `myconfig-components` together into whole
//! backups: a [`manager::BackupManager`] that runs exports and restores in
//! a fixed order, a [`manifest::Manifest`] recording what a backup
//! contains, cheap structural checks in [`verify`], and tar.gz
//! pack/unpack in [`archive`].

pub mod archive;
pub mod manager;
pub mod manifest;
pub mod verify;

pub use manager::BackupManager;
pub use manifest::{Manifest, ManifestEntry, VerifyReport, MANIFEST_FILENAME};
pub use verify::{verify_backup, ENVIRONMENT_FILE, MIN_BACKUP_BYTES};
