use crate::policy::RunDeadline;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Shared pause point for every summarization call
///
/// A rate-limit signal from any call pushes the resume time forward; every
/// call waits on the gate before it starts an attempt. The lock only guards
/// the timestamp and is never held across an await.
#[derive(Debug, Default)]
pub struct RateLimitGate {
    resume_at: Mutex<Option<Instant>>,
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pauses all calls for at least `duration` from now
    pub fn pause_for(&self, duration: Duration) {
        let until = Instant::now() + duration;
        let mut resume_at = self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        if resume_at.map_or(true, |current| current < until) {
            *resume_at = Some(until);
        }
    }

    /// The pending resume time, if a pause is active
    pub fn paused_until(&self) -> Option<Instant> {
        let resume_at = *self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        resume_at.filter(|until| *until > Instant::now())
    }

    /// Waits until no pause is active or the run deadline passes
    pub async fn wait(&self, deadline: &RunDeadline) {
        while let Some(until) = self.paused_until() {
            let remaining = deadline.remaining();
            if remaining.is_zero() {
                return;
            }
            let wait = until.saturating_duration_since(Instant::now()).min(remaining);
            tokio::time::sleep(wait).await;
        }
    }
}
