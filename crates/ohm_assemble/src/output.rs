//! Copying whole-file artifacts out and cleaning up temporaries.

use ohm_common::replace_extension;
use ohm_inventory::ModuleRecord;
use std::path::{Path, PathBuf};

use crate::error::{io_err, AssembleError};
use crate::sourcemap::fragment_path;

/// Copies each record's artifact to `<output_dir>/<relativePath>.abc`.
///
/// Destinations whose content already matches are left untouched.
pub fn copy_artifacts(records: &[ModuleRecord], output_dir: &Path) -> Result<usize, AssembleError> {
    let mut copied = 0;
    for record in records {
        let relative = replace_extension(record.relative_path.trim_start_matches('/'), ".abc");
        let dest = output_dir.join(relative);
        let bytes = std::fs::read(&record.artifact_path).map_err(io_err(&record.artifact_path))?;
        if std::fs::read(&dest).is_ok_and(|existing| existing == bytes) {
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        std::fs::write(&dest, bytes).map_err(io_err(&dest))?;
        copied += 1;
    }
    tracing::debug!(copied, "artifacts copied");
    Ok(copied)
}

/// Removes temporary manifests and, unless `retain_fragments` is set, the
/// per-file artifacts and source-map fragments of `records`.
pub fn cleanup(
    manifests: &[PathBuf],
    records: &[ModuleRecord],
    retain_fragments: bool,
) -> Result<(), AssembleError> {
    for path in manifests {
        remove_if_exists(path)?;
    }
    if !retain_fragments {
        for record in records {
            remove_if_exists(&record.artifact_path)?;
            remove_if_exists(&fragment_path(record))?;
        }
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), AssembleError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path)(e)),
    }
}
