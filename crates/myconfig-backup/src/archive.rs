//! Packing backups into portable tar.gz archives
//!
//! `pack` writes to a `.partial` name and renames on completion so an
//! interrupted run never leaves a plausible-looking truncated archive.
//! `unpack` extracts into a scratch directory next to the destination and
//! only promotes it after finding `MANIFEST.json` inside, so a corrupt or
//! foreign archive never lands under the requested name.

use crate::manifest::MANIFEST_FILENAME;
use anyhow::Context;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use myconfig_core::Error;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Archives the contents of `src_dir` into `outfile` (tar.gz). Returns the
/// archive size in bytes.
pub fn create_tar_gz(src_dir: &Path, outfile: &Path) -> anyhow::Result<u64> {
    let partial = partial_name(outfile);
    {
        let file = File::create(&partial)
            .with_context(|| format!("Failed to create {}", partial.display()))?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);
        builder
            .append_dir_all(".", src_dir)
            .with_context(|| format!("Failed to archive {}", src_dir.display()))?;
        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .context("Failed to finish archive")?;
    }
    fs::rename(&partial, outfile)
        .with_context(|| format!("Failed to finalize {}", outfile.display()))?;

    let size = fs::metadata(outfile)?.len();
    info!("Packed {} ({size} bytes)", outfile.display());
    Ok(size)
}

/// Extracts `archive` into `dest`. The archive must contain a
/// `MANIFEST.json` at its root; anything else is rejected as corrupt and
/// `dest` is left untouched.
pub fn extract_tar_gz(archive: &Path, dest: &Path) -> anyhow::Result<()> {
    if dest.exists() {
        anyhow::bail!("Destination already exists: {}", dest.display());
    }
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    // Scratch directory on the same filesystem as dest so the final
    // promotion is a rename.
    let scratch = tempfile::tempdir_in(parent).context("Failed to create scratch directory")?;
    let file = File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(scratch.path())
        .map_err(|e| {
            Error::invalid_archive(archive.display().to_string(), format!("extraction failed: {e}"))
        })?;

    if !scratch.path().join(MANIFEST_FILENAME).is_file() {
        return Err(Error::invalid_archive(
            archive.display().to_string(),
            format!("no {MANIFEST_FILENAME} inside"),
        )
        .into());
    }

    let scratch_path = scratch.keep();
    fs::rename(&scratch_path, dest)
        .with_context(|| format!("Failed to promote {}", dest.display()))?;
    info!("Unpacked {} into {}", archive.display(), dest.display());
    Ok(())
}

fn partial_name(outfile: &Path) -> std::path::PathBuf {
    let mut name = outfile.as_os_str().to_os_string();
    name.push(".partial");
    std::path::PathBuf::from(name)
}
