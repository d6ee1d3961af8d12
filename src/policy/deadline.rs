use std::time::Duration;
use tokio::time::Instant;

/// Wall-clock budget for one run
///
/// Stages check the deadline before starting a new unit of work (a fetch, a
/// summarization attempt). Work already in flight is allowed to finish.
#[derive(Debug, Clone, Copy)]
pub struct RunDeadline {
    expires_at: Instant,
}

impl RunDeadline {
    /// Starts a deadline that expires `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now() + budget,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
