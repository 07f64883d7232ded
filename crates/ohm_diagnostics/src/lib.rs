//! Structured error records, severity management, and rendering.
//!
//! Every fatal condition in the build layer surfaces as a [`Diagnostic`]: an
//! eight-digit [`DiagnosticCode`], a description, an optional cause and
//! position, and remediation steps. The thread-safe [`DiagnosticSink`]
//! accumulates them during an invocation, [`SignatureTable`] turns raw
//! compiler output into structured records, and [`DiagnosticRenderer`]
//! implementations format them for the terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod signature;
pub mod sink;

pub use code::{DiagnosticCode, ErrorKind, Subsystem};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use signature::{Signature, SignatureTable};
pub use sink::DiagnosticSink;
