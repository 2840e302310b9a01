//! Minimum-interval request limiter.

use std::time::{Duration, Instant};

/// Best-effort limiter holding a single last-request timestamp.
///
/// Rejected requests are not queued; callers report the wait and give up.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Returns `Err(seconds)` with the whole seconds still to wait, rounded
    /// up, if a request at `now` would come too soon.
    pub fn check(&self, now: Instant) -> Result<(), u64> {
        let Some(last) = self.last_request else {
            return Ok(());
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.min_interval {
            return Ok(());
        }
        let remaining = self.min_interval - elapsed;
        Err(remaining.as_nanos().div_ceil(1_000_000_000) as u64)
    }

    /// Marks a request as started at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_request = Some(now);
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
