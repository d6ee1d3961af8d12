use crate::fetch::FailedSource;
use crate::state::RunStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What happened to the digest email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The run ended before delivery
    NotAttempted,
    Delivered {
        attempts: u32,
        message_id: Option<String>,
    },
    Failed {
        attempts: u32,
        error: String,
    },
}

/// The single cause of a failed run
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RunFailure {
    #[error("no recipient configured")]
    NoRecipient,

    #[error("no sender address configured")]
    NoSender,

    #[error("source registry failed: {0}")]
    Registry(String),

    #[error("no content and sending empty digests is disabled")]
    NoContent,

    #[error("delivery failed after {attempts} attempt(s): {reason}")]
    DeliveryRejected { attempts: u32, reason: String },

    #[error("delivery retries exhausted after {attempts} attempt(s): {reason}")]
    DeliveryExhausted { attempts: u32, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Summary of one pipeline run
///
/// Created at run end and handed to the caller and the run store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub run_timestamp: DateTime<Utc>,
    pub config_hash: Option<String>,
    /// `Done` or `Failed`
    pub final_stage: RunStage,
    /// Raw items returned by all successful sources
    pub items_fetched: usize,
    /// Number of sources that failed to fetch or parse
    pub items_failed_sources: usize,
    /// Unique items left after deduplication
    pub items_deduplicated: usize,
    /// Items rendered into the digest (after the size cap)
    pub items_in_digest: usize,
    pub items_summarized_via_fallback: usize,
    pub summary_retries: u32,
    pub failed_sources: Vec<FailedSource>,
    /// Sources never started because the run deadline passed
    pub skipped_sources: Vec<String>,
    pub degraded: bool,
    pub time_bounded: bool,
    pub delivery_status: DeliveryStatus,
    pub failure: Option<RunFailure>,
    pub duration_ms: u64,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.final_stage == RunStage::Done
    }

    /// One-line description for logs and the history listing
    pub fn headline(&self) -> String {
        let outcome = match &self.failure {
            Some(failure) => format!("failed: {}", failure),
            None => "delivered".to_string(),
        };
        let mut flags = Vec::new();
        if self.degraded {
            flags.push("degraded");
        }
        if self.time_bounded {
            flags.push("time-bounded");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        format!(
            "{} {}: {} fetched, {} unique, {} in digest, {} fallback, {} failed source(s){}",
            self.run_timestamp.format("%Y-%m-%d %H:%M"),
            outcome,
            self.items_fetched,
            self.items_deduplicated,
            self.items_in_digest,
            self.items_summarized_via_fallback,
            self.items_failed_sources,
            flags
        )
    }
}
