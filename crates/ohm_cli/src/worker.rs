//! `ohm worker`: the process the legacy backend's pool spawns.
//!
//! The batch arrives through the environment. Success is exit code 0; on
//! failure the compiler's captured output goes to stderr, where the parent
//! reads it back and matches it against known error signatures.

use ohm_dispatch::{run_batch, DispatchError, WorkerBatch};

/// Runs the batch from the environment and returns the exit code.
pub fn run() -> i32 {
    let batch = match WorkerBatch::from_env() {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };
    match run_batch(&batch) {
        Ok(()) => 0,
        Err(e) => {
            eprint!("{}", failure_text(&e));
            1
        }
    }
}

fn failure_text(err: &DispatchError) -> String {
    match err {
        DispatchError::CompilerFailed { output, .. } if !output.trim().is_empty() => {
            if output.ends_with('\n') {
                output.clone()
            } else {
                format!("{output}\n")
            }
        }
        other => format!("{other}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn compiler_output_is_passed_through() {
        let err = DispatchError::CompilerFailed {
            program: PathBuf::from("/sdk/js2abc"),
            status: Some(2),
            output: "SyntaxError: Unexpected token".into(),
        };
        assert_eq!(failure_text(&err), "SyntaxError: Unexpected token\n");
    }

    #[test]
    fn silent_failure_reports_status() {
        let err = DispatchError::CompilerFailed {
            program: PathBuf::from("/sdk/js2abc"),
            status: Some(2),
            output: String::new(),
        };
        assert_eq!(failure_text(&err), "/sdk/js2abc exited with exit code 2\n");
    }
}
