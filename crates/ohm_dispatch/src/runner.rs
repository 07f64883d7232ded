//! Running one external tool to completion.

use std::process::Output;

use crate::command::CompilerArgs;
use crate::error::DispatchError;

/// Runs `args` and waits for it to exit.
///
/// A non-zero exit becomes [`DispatchError::CompilerFailed`] carrying the
/// tool's stderr followed by its stdout.
pub fn run_tool(args: &CompilerArgs) -> Result<(), DispatchError> {
    tracing::debug!(command = %args, "running");
    let output = args
        .to_command()
        .output()
        .map_err(|source| DispatchError::Launch {
            program: args.program.clone(),
            source,
        })?;
    if output.status.success() {
        return Ok(());
    }
    Err(DispatchError::CompilerFailed {
        program: args.program.clone(),
        status: output.status.code(),
        output: captured_text(&output),
    })
}

pub(crate) fn captured_text(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stdout);
    }
    text
}
