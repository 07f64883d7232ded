//! Error types for cache operations.

use ohm_diagnostics::{Diagnostic, DiagnosticCode};
use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Loading the ledger is fail-safe and never produces one of these. Once a
/// build is under way, every variant is fatal: there is no partial-success
/// path through the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A module's staged source is missing from the cache directory.
    #[error("cache file {path} does not exist")]
    MissingCacheFile {
        /// The expected cache file.
        path: PathBuf,
    },

    /// A compiled artifact referenced by the ledger is missing.
    #[error("compiled artifact {path} does not exist")]
    MissingArtifact {
        /// The expected artifact file.
        path: PathBuf,
    },

    /// The ledger could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl CacheError {
    /// Converts this error into a structured diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, description) = match self {
            CacheError::MissingCacheFile { .. } => {
                (DiagnosticCode::MISSING_CACHE_FILE, "Staged source file is missing")
            }
            CacheError::MissingArtifact { .. } => {
                (DiagnosticCode::MISSING_ARTIFACT, "Compiled artifact is missing")
            }
            CacheError::Io { .. } | CacheError::Serialization { .. } => {
                (DiagnosticCode::CACHE_IO, "Failed to update the build cache")
            }
        };
        let diag = Diagnostic::error(code, description).with_cause(self.to_string());
        match self {
            CacheError::Io { path, .. }
            | CacheError::MissingCacheFile { path }
            | CacheError::MissingArtifact { path } => diag
                .with_position(path.display().to_string())
                .with_solution("Delete the cache directory and rebuild."),
            CacheError::Serialization { .. } => diag,
        }
    }
}
