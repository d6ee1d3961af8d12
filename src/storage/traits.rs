//! Storage traits and error types
//!
//! This module defines the trait interface for run stores and the
//! associated error types.

use crate::dedup::DigestItem;
use crate::pipeline::RunResult;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt archive record at line {line}: {message}")]
    Corrupt { line: usize, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator called once at the end of every run
///
/// Failures are reported to the caller, which logs them; they never change
/// the run outcome.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Records the run result together with the items of its digest
    ///
    /// # Arguments
    ///
    /// * `result` - The finished run's result
    /// * `items` - The summarized items (empty when the run failed early)
    async fn store(&self, result: &RunResult, items: &[DigestItem]) -> StorageResult<()>;
}
