//! Output assembly.
//!
//! After every compiler call has succeeded, this crate merges protobuf
//! fragments into the final image (legacy backend), consolidates source-map
//! fragments, copies whole-file artifacts to the output directory and
//! removes temporary files.

#![warn(missing_docs)]

pub mod error;
pub mod merge;
pub mod output;
pub mod sourcemap;

pub use error::AssembleError;
pub use merge::{merge_fragments, NPM_ENTRIES_PROTO, PROTO_LIST};
pub use output::{cleanup, copy_artifacts};
pub use sourcemap::{fragment_path, PackageStamp, SourceMapStore, SOURCE_MAP_CACHE, SOURCE_MAP_FILE};
