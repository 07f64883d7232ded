//! The build-mode state machine.
//!
//! One [`BuildMode`](ohm_config::BuildMode) is selected per invocation. The
//! full build and preview modes run the incremental pipeline against the
//! ledger; the reload modes share a first-build latch held in
//! [`SessionState`] and afterwards emit patch images from a changed-file
//! list; the hot fix mode patches against an externally shipped symbol
//! table. [`PipelineContext`] owns everything that lives for exactly one
//! invocation.

#![warn(missing_docs)]

pub mod changed;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod session;

pub use changed::{read_changed_files, ChangeSet, ReloadSkip};
pub use context::PipelineContext;
pub use error::DriverError;
pub use pipeline::{run, BuildReport};
pub use session::SessionState;
