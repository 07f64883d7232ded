//! Error types for module URL resolution.

use ohm_diagnostics::{Diagnostic, DiagnosticCode};
use std::path::PathBuf;

/// Errors produced while resolving module URLs or reading package metadata.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No rule in the cascade produced a URL for the path.
    #[error("failed to resolve module URL for '{path}'")]
    Unresolved {
        /// The path as it was passed in.
        path: String,
    },

    /// The package metadata file could not be read.
    #[error("failed to read package metadata '{}': {source}", path.display())]
    MetadataIo {
        /// The metadata file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The package metadata file is not valid JSON of the expected shape.
    #[error("failed to parse package metadata '{}': {reason}", path.display())]
    MetadataParse {
        /// The metadata file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Neither the configuration nor the metadata file supplies a name.
    #[error("no {field} configured and no metadata file to read it from")]
    MissingName {
        /// Which name is missing (`bundle name` or `module name`).
        field: &'static str,
    },
}

impl ResolveError {
    /// Converts this error into a structured diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::Unresolved { path } => Diagnostic::error(
                DiagnosticCode::RESOLVE_FAILED,
                "Failed to get a resolved OhmUrl by filepath",
            )
            .with_position(path.clone())
            .with_solution(format!(
                "Check whether the module which {path} belongs to is correctly configured."
            ))
            .with_solution("Check the corresponding file name is correct (including case-sensitivity)."),
            ResolveError::MetadataIo { path, .. } | ResolveError::MetadataParse { path, .. } => {
                Diagnostic::error(DiagnosticCode::INVALID_CONFIG, "Failed to read package metadata")
                    .with_cause(self.to_string())
                    .with_position(path.display().to_string())
                    .with_solution("Check that the metadata file exists and declares app.bundleName and module.name.")
            }
            ResolveError::MissingName { .. } => {
                Diagnostic::error(DiagnosticCode::INVALID_CONFIG, self.to_string())
                    .with_solution("Set project.bundle_name and project.module_name, or project.module_json.")
            }
        }
    }
}
