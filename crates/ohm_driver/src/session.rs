//! State that outlives one invocation within a watch session.

use std::path::{Path, PathBuf};

/// The reload modes' first-build latch and the symbol table it produced.
///
/// A session starts with the latch open: the first reload build compiles
/// everything and dumps a symbol table. Once that build succeeds, later
/// builds patch against the recorded table until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct SessionState {
    first_build_done: bool,
    symbol_map: Option<PathBuf>,
    builds: usize,
}

impl SessionState {
    /// A fresh session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` until a first reload build has succeeded.
    pub fn is_first_build(&self) -> bool {
        !self.first_build_done
    }

    /// The symbol table dumped by the first build, once there is one.
    pub fn symbol_map(&self) -> Option<&Path> {
        self.symbol_map.as_deref()
    }

    /// Number of successful builds in this session.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub(crate) fn record_first_build(&mut self, symbol_map: PathBuf) {
        self.first_build_done = true;
        self.symbol_map = Some(symbol_map);
    }

    pub(crate) fn record_build(&mut self) {
        self.builds += 1;
    }

    /// Ends the session; the next reload build starts over.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
