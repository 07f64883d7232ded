//! Error types for inventory construction and source staging.

use ohm_diagnostics::{Diagnostic, DiagnosticCode};
use std::path::PathBuf;

/// Errors produced while reading the file list or staging sources.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// A file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file list document is malformed.
    #[error("failed to parse file list: {reason}")]
    FileListParse {
        /// Description of the parse failure.
        reason: String,
    },
}

impl InventoryError {
    /// Converts this error into a structured diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            InventoryError::Io { path, .. } => {
                Diagnostic::error(DiagnosticCode::CACHE_IO, "Failed to stage source file")
                    .with_cause(self.to_string())
                    .with_position(path.display().to_string())
            }
            InventoryError::FileListParse { .. } => {
                Diagnostic::error(DiagnosticCode::INVALID_CONFIG, "Invalid file list")
                    .with_cause(self.to_string())
                    .with_solution("Pass a JSON document of the form {\"files\": [{\"path\": ...}]}.")
            }
        }
    }
}
