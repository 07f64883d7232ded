//! The error type of one pipeline invocation.

use ohm_assemble::AssembleError;
use ohm_cache::CacheError;
use ohm_config::ConfigError;
use ohm_diagnostics::{Diagnostic, DiagnosticCode, SignatureTable};
use ohm_dispatch::DispatchError;
use ohm_inventory::InventoryError;
use ohm_resolve::ResolveError;
use std::path::PathBuf;

/// Any fatal condition of an invocation. Every variant aborts the build.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Package names could not be determined.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The file list could not be read or a source could not be staged.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// The ledger is inconsistent with the cache directory.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The compiler or a worker failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Merging or writing outputs failed.
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// The changed-files document is malformed.
    #[error("invalid changed-files document {}: {reason}", path.display())]
    ChangedFiles {
        /// The document.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },
}

impl DriverError {
    /// Converts this error into a structured diagnostic.
    pub fn to_diagnostic(&self, signatures: &SignatureTable) -> Diagnostic {
        match self {
            DriverError::Config(err) => {
                Diagnostic::error(DiagnosticCode::INVALID_CONFIG, "Invalid configuration")
                    .with_cause(err.to_string())
                    .with_solution("Check ohm.toml and the mode flags passed on the command line.")
            }
            DriverError::Resolve(err) => err.to_diagnostic(),
            DriverError::Inventory(err) => err.to_diagnostic(),
            DriverError::Cache(err) => err.to_diagnostic(),
            DriverError::Dispatch(err) => err.to_diagnostic(signatures),
            DriverError::Assemble(err) => err.to_diagnostic(signatures),
            DriverError::ChangedFiles { path, .. } => {
                Diagnostic::error(DiagnosticCode::INVALID_CONFIG, "Invalid changed-files document")
                    .with_cause(self.to_string())
                    .with_position(path.display().to_string())
                    .with_solution(
                        "Write {\"modifiedFiles\": [...]} or {\"modifiedFilesV2\": [{\"filePath\": ...}]}.",
                    )
            }
        }
    }
}
