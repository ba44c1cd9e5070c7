//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Ceiling for any single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// Retry budget and backoff curve for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt on a tier.
    pub max_retries: u32,
    /// Delay before the first retry, before jitter.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the delay before retry number `retry_count` (0-based),
    /// capped at [`MAX_BACKOFF`].
    pub fn max_delay(&self, retry_count: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry_count))
            .min(MAX_BACKOFF)
    }

    /// Delay before retry number `retry_count`: `base * 2^n * (0.5 + rand * 0.5)`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().gen_range(0.5..=1.0);
        self.max_delay(retry_count).mul_f64(jitter)
    }
}
