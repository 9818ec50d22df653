//! Retry policy for catalog requests.

use std::time::Duration;

use crate::error::ApiError;

/// Statuses the policy will replay: request timeout, throttling, and
/// transient server failures.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Whether a status belongs to the retryable set.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Exponential backoff with jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Initial delay, doubled each attempt.
    pub base_delay: Duration,
    /// Ceiling on any computed delay.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Whether the error may be replayed at this attempt (0-indexed).
    pub fn should_retry(&self, error: &ApiError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_retryable()
    }

    /// Delay before the given retry (0-indexed): `base * 2^attempt` plus
    /// random jitter, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let multiplier = 2u64.saturating_pow(attempt);
        let base = Duration::from_millis(
            (self.base_delay.as_millis() as u64).saturating_mul(multiplier),
        );
        let jitter = Duration::from_millis(
            rand::thread_rng().gen_range(0..=self.max_jitter.as_millis() as u64),
        );
        std::cmp::min(base + jitter, self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}
