//! Run stage definitions for the digest pipeline
//!
//! A run moves strictly forward through these stages; `Failed` is reachable
//! from any stage that is not already terminal.

use crate::DigestError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current stage of one digest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    // ===== Active Stages =====
    /// Run created, nothing done yet
    Start,

    /// Sources listed and being fetched
    FetchingSources,

    /// Raw items being merged across sources
    Deduplicating,

    /// Items being summarized
    Summarizing,

    /// Digest being rendered
    Formatting,

    /// Digest being handed to the mail transport
    Delivering,

    // ===== Terminal Stages =====
    /// Digest delivered
    Done,

    /// Run ended on an unrecoverable condition
    Failed,
}

impl RunStage {
    /// Returns true if the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The stage that follows this one on the success path
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::FetchingSources),
            Self::FetchingSources => Some(Self::Deduplicating),
            Self::Deduplicating => Some(Self::Summarizing),
            Self::Summarizing => Some(Self::Formatting),
            Self::Formatting => Some(Self::Delivering),
            Self::Delivering => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Whether `to` may directly follow this stage
    pub fn can_transition_to(&self, to: RunStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::FetchingSources => "fetching_sources",
            Self::Deduplicating => "deduplicating",
            Self::Summarizing => "summarizing",
            Self::Formatting => "formatting",
            Self::Delivering => "delivering",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one run's stage and rejects out-of-order transitions
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: RunStage,
    visited: Vec<RunStage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: RunStage::Start,
            visited: vec![RunStage::Start],
        }
    }

    pub fn current(&self) -> RunStage {
        self.current
    }

    /// Every stage entered so far, in order
    pub fn visited(&self) -> &[RunStage] {
        &self.visited
    }

    /// Moves to `to`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The transition was legal and has been applied
    /// * `Err(DigestError::InvalidTransition)` - `to` cannot follow the
    ///   current stage; the tracker is unchanged
    pub fn transition(&mut self, to: RunStage) -> Result<(), DigestError> {
        if !self.current.can_transition_to(to) {
            return Err(DigestError::InvalidTransition {
                from: self.current,
                to,
            });
        }
        tracing::debug!("Run stage {} -> {}", self.current, to);
        self.current = to;
        self.visited.push(to);
        Ok(())
    }
}
