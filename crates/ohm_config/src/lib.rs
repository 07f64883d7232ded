//! Parsing and validation of `ohm.toml` project configuration files.
//!
//! This crate reads the project configuration and produces a strongly-typed
//! [`ProjectConfig`], then resolves it against the configuration file's
//! directory into a [`ResolvedConfig`] with absolute paths, a concrete
//! [`Backend`], and the [`BuildMode`] selected for this invocation.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod mode;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_path, load_config_from_str, CONFIG_FILE};
pub use mode::{BuildMode, ModeFlags};
pub use resolve::{resolve_config, Backend, ResolvedConfig};
pub use types::*;
