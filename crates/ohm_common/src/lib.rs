//! Shared foundational types used across the Ohm build layer.
//!
//! This crate provides content hashing and the unix-style path helpers that
//! every stage of the pipeline shares.

#![warn(missing_docs)]

pub mod hash;
pub mod path;

pub use hash::{ContentHash, ParseHashError};
pub use path::{relative_unix, replace_extension, strip_extension, to_unix_path};
