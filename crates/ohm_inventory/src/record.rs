//! Per-file and per-package inventory records.

use ohm_cache::LedgerItem;
use std::path::{Path, PathBuf};

use crate::classify::SourceKind;

/// Everything the pipeline knows about one compiled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Absolute source path.
    pub source_path: PathBuf,
    /// Staged copy the compiler reads.
    pub cache_path: PathBuf,
    /// Compiled fragment derived from the cache path.
    pub artifact_path: PathBuf,
    /// Runtime module URL.
    pub module_url: String,
    /// CommonJS rather than ECMAScript module.
    pub is_common_format: bool,
    /// Owning package name, or the module name for project files.
    pub package_name: String,
    /// Owning package version, if known.
    pub package_version: Option<String>,
    /// Unix path relative to the project root; the source-map key.
    pub relative_path: String,
    /// Source language.
    pub source_kind: SourceKind,
}

impl ModuleRecord {
    /// `commonjs` or `esm`, as written in manifests.
    pub fn format_kind(&self) -> &'static str {
        if self.is_common_format {
            "commonjs"
        } else {
            "esm"
        }
    }
}

impl LedgerItem for ModuleRecord {
    fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }
}

/// Entry point of one external dependency package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntryRecord {
    /// URL of the package root directory.
    pub entry_identifier: String,
    /// URL of the package's entry file.
    pub build_target_path: String,
}
