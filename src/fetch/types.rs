use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One feed entry as fetched, before deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    /// URL of the feed this entry came from
    pub source_url: String,
    pub title: String,
    /// Absolute entry link, if the feed provided one
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Plain-text body with markup removed
    pub raw_body: String,
}

/// Why a single source produced no items
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("network error for {url}: {message}")]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("failed to parse feed {url}: {message}")]
    Parse { url: String, message: String },

    #[error("timed out fetching {url} after {after:?}")]
    Timeout { url: String, after: Duration },
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::Parse { .. } => FailureKind::Parse,
            Self::Timeout { .. } => FailureKind::Timeout,
        }
    }

    /// Timeouts, connection failures and 5xx responses are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Network { status: None, .. } => true,
            Self::Network {
                status: Some(status),
                ..
            } => *status >= 500,
            Self::Parse { .. } => false,
        }
    }
}

/// Failure category recorded in the run result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Parse,
    Timeout,
}

/// Result of fetching one source: items, or an empty list and the reason
///
/// The fetcher never returns an error past its own boundary; a failed source
/// is just an outcome with `failure` set.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub items: Vec<RawItem>,
    pub failure: Option<FetchError>,
}

impl FetchOutcome {
    pub fn success(items: Vec<RawItem>) -> Self {
        Self {
            items,
            failure: None,
        }
    }

    pub fn failed(error: FetchError) -> Self {
        Self {
            items: Vec::new(),
            failure: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// A source that failed during a run, as reported to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSource {
    pub name: String,
    pub url: String,
    pub kind: FailureKind,
    pub reason: String,
}
