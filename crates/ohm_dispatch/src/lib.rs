//! Work distribution to the external bytecode compiler.
//!
//! The modern backend receives every must-compile module in one files-info
//! manifest and parallelizes internally. The legacy backend is
//! single-threaded, so must-compile modules are [`partition`]ed into batches
//! and each batch runs in a short-lived worker process spawned by
//! [`WorkerPool`]. A failing compiler is always fatal; its captured output is
//! classified into a diagnostic by the caller.

#![warn(missing_docs)]

pub mod command;
pub mod dispatch;
pub mod error;
pub mod manifest;
pub mod partition;
pub mod pool;
pub mod runner;
pub mod worker;

pub use command::{thread_hint, CompilerArgs, ModernCommand, SymbolFlags};
pub use dispatch::{base_args, compile, CompileRequest, MODULES_IMAGE};
pub use error::DispatchError;
pub use partition::partition;
pub use pool::WorkerPool;
pub use runner::run_tool;
pub use worker::{run_batch, CompilePath, FileJob, WorkerBatch, BATCH_ENV, BATCH_FILE_ENV};
