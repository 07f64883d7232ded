//! `ohm watch`: a reload session driven by stdin.
//!
//! The session builds once on start and once more for every line read from
//! stdin. [`SessionState`] lives until EOF, so the reload modes dump their
//! symbol table on the first successful build and emit patches afterwards.
//! A failed build does not end the session.

use std::io::BufRead;

use ohm_driver::SessionState;

use crate::build::build_once;
use crate::{BuildArgs, GlobalArgs};

/// Runs the `ohm watch` command. Returns the exit code of the last build.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    session(args, global, stdin.lock())
}

fn session(
    args: &BuildArgs,
    global: &GlobalArgs,
    triggers: impl BufRead,
) -> Result<i32, Box<dyn std::error::Error>> {
    let mut state = SessionState::new();
    let mut code = build_once(args, global, &mut state)?;
    for line in triggers.lines() {
        let line = line?;
        tracing::debug!(trigger = line.trim(), "rebuild requested");
        code = build_once(args, global, &mut state)?;
    }
    tracing::info!(builds = state.builds(), "watch session ended");
    Ok(code)
}
