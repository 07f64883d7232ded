//! Error types for output assembly.

use ohm_diagnostics::{Diagnostic, DiagnosticCode, SignatureTable};
use ohm_dispatch::DispatchError;
use std::path::PathBuf;

/// Errors raised while assembling outputs. All are fatal.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    /// The merge tool exited non-zero or could not be started.
    #[error("merge tool failed: {reason}")]
    MergeFailed {
        /// What went wrong.
        reason: String,
        /// Captured tool output.
        output: String,
    },

    /// Compiling the package entries manifest failed.
    #[error(transparent)]
    Compiler(#[from] DispatchError),

    /// An output could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A source-map fragment is not valid JSON.
    #[error("invalid source map {path}: {reason}")]
    SourceMapParse {
        /// The fragment.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },
}

impl AssembleError {
    /// Converts this error into a structured diagnostic.
    pub fn to_diagnostic(&self, signatures: &SignatureTable) -> Diagnostic {
        match self {
            AssembleError::MergeFailed { output, .. } => {
                let mut cause = self.to_string();
                if !output.trim().is_empty() {
                    cause.push('\n');
                    cause.push_str(output.trim());
                }
                Diagnostic::error(DiagnosticCode::MERGE_FAILED, "Failed to merge bytecode fragments")
                    .with_cause(cause)
                    .with_solution("Run a clean build.")
            }
            AssembleError::Compiler(inner) => inner.to_diagnostic(signatures),
            AssembleError::Io { path, .. } => {
                Diagnostic::error(DiagnosticCode::OUTPUT_IO, "Failed to write build output")
                    .with_cause(self.to_string())
                    .with_position(path.display().to_string())
            }
            AssembleError::SourceMapParse { path, .. } => {
                Diagnostic::error(DiagnosticCode::OUTPUT_IO, "Invalid source map fragment")
                    .with_cause(self.to_string())
                    .with_position(path.display().to_string())
            }
        }
    }
}

pub(crate) fn io_err(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> AssembleError + '_ {
    move |source| AssembleError::Io {
        path: path.to_path_buf(),
        source,
    }
}
