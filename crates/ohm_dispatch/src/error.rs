//! Error types for work distribution.

use ohm_diagnostics::{Diagnostic, DiagnosticCode, SignatureTable};
use std::path::PathBuf;

/// Errors that abort compilation. None of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// An external program could not be started.
    #[error("failed to launch {}: {source}", program.display())]
    Launch {
        /// The program that failed to start.
        program: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler exited non-zero.
    #[error("{} exited with {}", program.display(), describe_status(*status))]
    CompilerFailed {
        /// The compiler program.
        program: PathBuf,
        /// Exit code, if the process exited normally.
        status: Option<i32>,
        /// Captured stderr followed by stdout.
        output: String,
    },

    /// A worker process exited non-zero.
    #[error("worker {index} exited with {}", describe_status(*status))]
    WorkerFailed {
        /// Index of the failed batch.
        index: usize,
        /// Exit code, if the process exited normally.
        status: Option<i32>,
        /// The worker's captured stderr.
        output: String,
    },

    /// A manifest or batch file could not be written or read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A worker batch could not be encoded or decoded.
    #[error("invalid worker batch: {reason}")]
    Batch {
        /// Description of the failure.
        reason: String,
    },
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

impl DispatchError {
    /// Converts this error into a structured diagnostic, matching captured
    /// tool output against `signatures`.
    pub fn to_diagnostic(&self, signatures: &SignatureTable) -> Diagnostic {
        match self {
            DispatchError::Launch { program, .. } => {
                Diagnostic::error(DiagnosticCode::COMPILER_LAUNCH, "Failed to launch the compiler")
                    .with_cause(self.to_string())
                    .with_position(program.display().to_string())
                    .with_solution("Check compiler.path in ohm.toml.")
            }
            DispatchError::CompilerFailed { output, .. } => {
                signatures.classify(output, DiagnosticCode::COMPILER_FAILED)
            }
            DispatchError::WorkerFailed { output, .. } => {
                signatures.classify(output, DiagnosticCode::WORKER_FAILED)
            }
            DispatchError::Io { path, .. } => {
                Diagnostic::error(DiagnosticCode::CACHE_IO, "Failed to write a compiler manifest")
                    .with_cause(self.to_string())
                    .with_position(path.display().to_string())
            }
            DispatchError::Batch { .. } => {
                Diagnostic::error(DiagnosticCode::WORKER_FAILED, "Worker received an invalid batch")
                    .with_cause(self.to_string())
            }
        }
    }
}
