use backoff::ExponentialBackoff;
use std::time::Duration;

/// Retry budget and delay schedule for one kind of external call
///
/// A call is attempted once and then retried up to `max_retries` times. The
/// delay before retry `n` (1-based) is `base_delay * 2^(n-1)`, capped at
/// `max_delay`, without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Total number of attempts, the first call included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Builds a fresh backoff schedule for one call
    ///
    /// The schedule never expires on its own; callers stop after
    /// `max_retries` delays.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: self.max_delay,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}
