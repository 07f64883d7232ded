//! The parent side of the legacy worker pool.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::error::DispatchError;
use crate::runner::captured_text;
use crate::worker::{WorkerBatch, BATCH_ENV, BATCH_FILE_ENV};

/// Batches larger than this travel through a file instead of the environment.
const MAX_ENV_BATCH: usize = 64 * 1024;

/// Spawns one worker process per batch and waits for all of them.
///
/// Workers are spawned fresh on every call and never reused.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl WorkerPool {
    /// A pool whose workers run `program worker`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: vec!["worker".to_string()],
        }
    }

    /// A pool re-executing the running binary.
    pub fn current() -> Result<Self, DispatchError> {
        let exe = std::env::current_exe().map_err(|e| DispatchError::Io {
            path: PathBuf::from("<current executable>"),
            source: e,
        })?;
        Ok(Self::new(exe))
    }

    /// Replaces the arguments passed to each worker (`worker` by default).
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    /// Runs every batch to completion.
    ///
    /// Oversized batches are written under `scratch_dir`. Every worker is
    /// awaited even after a failure; the failure with the lowest batch index
    /// is returned.
    pub fn run(&self, batches: &[WorkerBatch], scratch_dir: &Path) -> Result<(), DispatchError> {
        let mut children: Vec<(usize, Child)> = Vec::with_capacity(batches.len());
        for batch in batches {
            match self.spawn(batch, scratch_dir) {
                Ok(child) => children.push((batch.index, child)),
                Err(err) => {
                    Self::reap(children);
                    return Err(err);
                }
            }
        }
        tracing::debug!(workers = children.len(), "workers spawned");

        let mut clean = 0usize;
        let mut failure: Option<DispatchError> = None;
        for (index, child) in children {
            let result = child.wait_with_output();
            match result {
                Ok(output) if output.status.success() => clean += 1,
                Ok(output) => {
                    tracing::debug!(index, status = ?output.status.code(), "worker failed");
                    failure.get_or_insert(DispatchError::WorkerFailed {
                        index,
                        status: output.status.code(),
                        output: captured_text(&output),
                    });
                }
                Err(e) => {
                    failure.get_or_insert(DispatchError::WorkerFailed {
                        index,
                        status: None,
                        output: e.to_string(),
                    });
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => {
                tracing::debug!(clean, "all workers finished");
                Ok(())
            }
        }
    }

    fn spawn(&self, batch: &WorkerBatch, scratch_dir: &Path) -> Result<Child, DispatchError> {
        let encoded = batch.encode()?;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .env_remove(BATCH_ENV)
            .env_remove(BATCH_FILE_ENV)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if encoded.len() > MAX_ENV_BATCH {
            std::fs::create_dir_all(scratch_dir).map_err(|e| DispatchError::Io {
                path: scratch_dir.to_path_buf(),
                source: e,
            })?;
            let path = scratch_dir.join(format!("workerBatch_{}.json", batch.index));
            std::fs::write(&path, &encoded).map_err(|e| DispatchError::Io {
                path: path.clone(),
                source: e,
            })?;
            cmd.env(BATCH_FILE_ENV, &path);
        } else {
            cmd.env(BATCH_ENV, &encoded);
        }

        cmd.spawn().map_err(|source| DispatchError::Launch {
            program: self.program.clone(),
            source,
        })
    }

    fn reap(children: Vec<(usize, Child)>) {
        for (_, mut child) in children {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::worker::CompilePath;

    fn batch(index: usize) -> WorkerBatch {
        WorkerBatch {
            index,
            program: PathBuf::from("/bin/true"),
            base_args: Vec::new(),
            compile_path: CompilePath::PerModule,
            jobs: Vec::new(),
            manifest: Some(PathBuf::from(format!("/tmp/filesInfo_{index}.txt"))),
        }
    }

    /// A pool whose workers are shell snippets reading the batch from the
    /// environment, standing in for the re-executed binary.
    fn shell_pool(script: &str) -> WorkerPool {
        WorkerPool::new("/bin/sh").with_args(vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn all_clean() {
        let dir = tempfile::tempdir().unwrap();
        let pool = shell_pool("test -n \"$OHM_WORKER_BATCH\"");
        pool.run(&[batch(0), batch(1), batch(2)], dir.path()).unwrap();
    }

    #[test]
    fn one_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let pool = shell_pool(
            "case \"$OHM_WORKER_BATCH\" in *filesInfo_1*) echo 'SyntaxError: x' >&2; exit 2;; esac",
        );
        let err = pool.run(&[batch(0), batch(1), batch(2)], dir.path()).unwrap_err();
        match err {
            DispatchError::WorkerFailed { index, status, output } => {
                assert_eq!(index, 1);
                assert_eq!(status, Some(2));
                assert_eq!(output, "SyntaxError: x\n");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn oversized_batch_goes_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut big = batch(0);
        big.base_args = vec!["x".repeat(MAX_ENV_BATCH)];
        let pool = shell_pool("test -z \"$OHM_WORKER_BATCH\" && test -s \"$OHM_WORKER_BATCH_FILE\"");
        pool.run(&[big], dir.path()).unwrap();
        assert!(dir.path().join("workerBatch_0.json").exists());
    }

    #[test]
    fn missing_worker_program() {
        let dir = tempfile::tempdir().unwrap();
        let err = WorkerPool::new("/nonexistent/ohm")
            .run(&[batch(0)], dir.path())
            .unwrap_err();
        assert!(matches!(err, DispatchError::Launch { .. }));
    }
}
