//! Storage module for persisting run history
//!
//! This module handles:
//! - The `RunStore` collaborator the orchestrator reports to after each run
//! - A JSON-lines archive implementation
//! - Reading the archive back for the history listing

mod archive;
mod traits;

pub use archive::{load_archive, ArchiveRecord, JsonlArchive};
pub use traits::{RunStore, StorageError, StorageResult};
