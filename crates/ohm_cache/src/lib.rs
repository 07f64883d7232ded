//! Incremental build cache for the Ohm build layer.
//!
//! A two-level ledger decides which modules can skip compilation: a coarse
//! configuration [`fingerprint`] that invalidates everything when any
//! semantics-affecting setting changes, and a fine per-file map of content
//! hashes for each module's staged source and compiled artifact.

#![warn(missing_docs)]

pub mod error;
pub mod fingerprint;
pub mod hasher;
pub mod ledger;

pub use error::CacheError;
pub use fingerprint::global_fingerprint;
pub use hasher::SourceHasher;
pub use ledger::{Ledger, LedgerItem, LoadOutcome, Partition};
