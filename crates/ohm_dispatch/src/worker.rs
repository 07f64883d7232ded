//! The worker side of the legacy worker pool.
//!
//! A worker is the `ohm` binary re-executed in hidden `worker` mode. It
//! reads one [`WorkerBatch`] from the environment, compiles it in
//! assignment order and exits. Results travel back only through the exit
//! code and stderr.

use ohm_config::CompileMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::command::CompilerArgs;
use crate::error::DispatchError;
use crate::runner::run_tool;

/// Environment variable carrying the serialized batch.
pub const BATCH_ENV: &str = "OHM_WORKER_BATCH";

/// Environment variable naming a file with the serialized batch, used when
/// the batch is too large for the environment.
pub const BATCH_FILE_ENV: &str = "OHM_WORKER_BATCH_FILE";

/// Granularity of compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilePath {
    /// One artifact per file, compiled one call at a time.
    WholeFile,
    /// Fragments merged into one image, compiled one manifest per call.
    PerModule,
}

impl From<CompileMode> for CompilePath {
    fn from(mode: CompileMode) -> Self {
        match mode {
            CompileMode::Bundle => CompilePath::WholeFile,
            CompileMode::Module => CompilePath::PerModule,
        }
    }
}

/// One file of a whole-file batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileJob {
    /// Staged source.
    pub cache_path: PathBuf,
    /// Artifact to write.
    pub artifact_path: PathBuf,
}

/// Everything a worker needs to compile its share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerBatch {
    /// Batch index, for reporting.
    pub index: usize,
    /// Compiler program.
    pub program: PathBuf,
    /// Arguments shared by every call.
    pub base_args: Vec<String>,
    /// Granularity of compilation.
    pub compile_path: CompilePath,
    /// Files, in assignment order (whole-file path).
    #[serde(default)]
    pub jobs: Vec<FileJob>,
    /// Batch manifest (per-module path).
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

impl WorkerBatch {
    /// Serializes the batch for the environment.
    pub fn encode(&self) -> Result<String, DispatchError> {
        serde_json::to_string(self).map_err(|e| DispatchError::Batch {
            reason: e.to_string(),
        })
    }

    /// Parses a serialized batch.
    pub fn decode(text: &str) -> Result<Self, DispatchError> {
        serde_json::from_str(text).map_err(|e| DispatchError::Batch {
            reason: e.to_string(),
        })
    }

    /// Reads the batch a parent passed to this process.
    pub fn from_env() -> Result<Self, DispatchError> {
        if let Ok(text) = std::env::var(BATCH_ENV) {
            return Self::decode(&text);
        }
        let path = std::env::var_os(BATCH_FILE_ENV).map(PathBuf::from).ok_or_else(|| {
            DispatchError::Batch {
                reason: format!("neither {BATCH_ENV} nor {BATCH_FILE_ENV} is set"),
            }
        })?;
        let text = std::fs::read_to_string(&path).map_err(|e| DispatchError::Io { path, source: e })?;
        Self::decode(&text)
    }

    fn base(&self) -> CompilerArgs {
        self.base_args
            .iter()
            .fold(CompilerArgs::new(&self.program), |args, a| args.arg(a))
    }
}

/// Compiles a batch in assignment order, stopping at the first failure.
pub fn run_batch(batch: &WorkerBatch) -> Result<(), DispatchError> {
    match batch.compile_path {
        CompilePath::WholeFile => {
            for job in &batch.jobs {
                let args = batch
                    .base()
                    .arg(job.cache_path.as_os_str())
                    .flag_path("--output", &job.artifact_path);
                run_tool(&args)?;
            }
            Ok(())
        }
        CompilePath::PerModule => match &batch.manifest {
            Some(manifest) => run_tool(
                &batch
                    .base()
                    .arg("--output-proto")
                    .flag_path("--input-file", manifest),
            ),
            None => Err(DispatchError::Batch {
                reason: format!("per-module batch {} has no manifest", batch.index),
            }),
        },
    }
}
