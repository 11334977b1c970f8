//! Retry policy for provider requests.
//!
//! # Retry Strategy
//!
//! - Max 3 attempts per image
//! - Exponential backoff: 1s -> 2s -> 4s, capped at 60s
//! - Respects a provider-supplied `retry-after` for rate limits

use std::time::Duration;

/// How often and how patiently a failed request is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first
    pub max_attempts: u32,
    /// Wait before the first retry
    pub initial_delay: Duration,
    /// Growth factor between consecutive waits
    pub backoff: f64,
    /// Upper bound for any wait, including a server-supplied one
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            backoff: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Constant `delay` between up to `max_attempts` attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            backoff: 1.0,
            max_delay: delay,
        }
    }

    /// Backoff wait before retry number `retry` (0 for the first retry).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Wait before the next attempt once `attempts_made` have failed, or
    /// `None` when the budget is spent. A server-supplied `retry_after`
    /// replaces the backoff but is still capped.
    pub fn next_wait(&self, attempts_made: u32, retry_after: Option<Duration>) -> Option<Duration> {
        if attempts_made >= self.max_attempts {
            return None;
        }
        let wait = match retry_after {
            Some(wait) => wait.min(self.max_delay),
            None => self.backoff_delay(attempts_made.saturating_sub(1)),
        };
        Some(wait)
    }
}
