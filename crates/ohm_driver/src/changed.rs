//! The host's changed-files document for reload builds.
//!
//! Two shapes are accepted: `{"modifiedFiles": [...]}` with paths relative
//! to the module source root, and `{"modifiedFilesV2": [{"filePath": ...}]}`
//! with absolute paths. When both are present the v2 list wins.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::DriverError;

#[derive(Debug, Default, Deserialize)]
struct ChangedFilesDoc {
    #[serde(rename = "modifiedFiles", default)]
    modified_files: Option<Vec<String>>,
    #[serde(rename = "modifiedFilesV2", default)]
    modified_files_v2: Option<Vec<ChangedFileV2>>,
}

#[derive(Debug, Deserialize)]
struct ChangedFileV2 {
    #[serde(rename = "filePath")]
    file_path: String,
}

/// Why a reload build was skipped without compiling anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadSkip {
    /// No changed-files document exists.
    MissingDocument,
    /// The document lists no files.
    EmptyList,
    /// A structured-config file changed; a patch cannot carry it.
    StructuredConfig(PathBuf),
    /// A v2 entry lies outside the project.
    OutsideProject(PathBuf),
}

impl fmt::Display for ReloadSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadSkip::MissingDocument => f.write_str("no changed-files document"),
            ReloadSkip::EmptyList => f.write_str("no files changed"),
            ReloadSkip::StructuredConfig(p) => write!(f, "{} is a structured-config file", p.display()),
            ReloadSkip::OutsideProject(p) => write!(f, "{} is outside the project", p.display()),
        }
    }
}

/// The outcome of reading a changed-files document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    /// Absolute paths to recompile, in document order.
    Files(Vec<PathBuf>),
    /// Nothing may be compiled this time.
    Skip(ReloadSkip),
}

/// Reads the changed-files document at `path`.
///
/// v1 entries are anchored at `source_root`. A malformed document is an
/// error; every other irregularity skips the reload.
pub fn read_changed_files(
    path: Option<&Path>,
    source_root: &Path,
    project_root: &Path,
) -> Result<ChangeSet, DriverError> {
    let Some(path) = path else {
        return Ok(ChangeSet::Skip(ReloadSkip::MissingDocument));
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ChangeSet::Skip(ReloadSkip::MissingDocument));
        }
        Err(e) => {
            return Err(DriverError::ChangedFiles {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };
    let doc: ChangedFilesDoc = serde_json::from_str(&text).map_err(|e| DriverError::ChangedFiles {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let files: Vec<PathBuf> = match (doc.modified_files_v2, doc.modified_files) {
        (Some(v2), _) => {
            let mut files = Vec::with_capacity(v2.len());
            for entry in v2 {
                let file = PathBuf::from(entry.file_path);
                if !file.starts_with(project_root) {
                    return Ok(ChangeSet::Skip(ReloadSkip::OutsideProject(file)));
                }
                files.push(file);
            }
            files
        }
        (None, Some(v1)) => v1.iter().map(|rel| source_root.join(rel)).collect(),
        (None, None) => Vec::new(),
    };

    if files.is_empty() {
        return Ok(ChangeSet::Skip(ReloadSkip::EmptyList));
    }
    if let Some(config) = files
        .iter()
        .find(|f| f.extension().is_some_and(|ext| ext == "json"))
    {
        return Ok(ChangeSet::Skip(ReloadSkip::StructuredConfig(config.clone())));
    }
    Ok(ChangeSet::Files(files))
}
