//! The host-supplied file list.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::InventoryError;

/// How a module exports its bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// CommonJS (`require`/`module.exports`).
    Commonjs,
    /// ECMAScript modules.
    Esm,
}

/// The dependency package a file belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    /// Package name.
    pub name: String,
    /// Package version, recorded in source maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Package root directory.
    pub root: PathBuf,
}

/// One file of the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute source path. Virtual modules start with `\0`.
    pub path: PathBuf,
    /// Whether this file is its package's entry point.
    #[serde(default)]
    pub is_entry: bool,
    /// Owning dependency package, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageRef>,
    /// Namespace for the file's module URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Module format hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ModuleFormat>,
}

impl FileEntry {
    /// A plain project file with no metadata.
    pub fn plain(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_entry: false,
            package: None,
            namespace: None,
            format: None,
        }
    }
}

/// The ordered list of files to build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    /// Files in host order.
    pub files: Vec<FileEntry>,
}

impl FileList {
    /// Parses a file list document.
    pub fn from_json(content: &str) -> Result<Self, InventoryError> {
        serde_json::from_str(content).map_err(|e| InventoryError::FileListParse {
            reason: e.to_string(),
        })
    }

    /// Reads and parses a file list document.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let content = std::fs::read_to_string(path).map_err(|e| InventoryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Builds a list of plain files.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: paths.into_iter().map(FileEntry::plain).collect(),
        }
    }
}
