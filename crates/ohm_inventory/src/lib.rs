//! The module and package inventory for one invocation.
//!
//! A single pass over the host's file list classifies each file, derives its
//! cache and artifact paths, resolves its module URL and records dependency
//! package entry points. The resulting [`Inventory`] is immutable and is the
//! input to ledger filtering and work distribution.

#![warn(missing_docs)]

pub mod classify;
pub mod error;
pub mod file_list;
pub mod inventory;
pub mod record;
pub mod stage;

pub use classify::{classify, SkipReason, SourceKind};
pub use error::InventoryError;
pub use file_list::{FileEntry, FileList, ModuleFormat, PackageRef};
pub use inventory::{Inventory, TEMPORARY_DIR};
pub use record::{ModuleRecord, PackageEntryRecord};
pub use stage::stage_sources;
