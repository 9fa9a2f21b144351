//! Retry policy for the read path: decides whether and how long to wait.

use std::time::Duration;

use crate::config::ReadRetryConfig;

/// Fixed-delay retry policy.
///
/// Blind re-attempts: no jitter, no backoff escalation, no circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,

    /// Wait between two attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Delay before the next attempt, or `None` once `attempts` used up the budget.
    ///
    /// # Arguments
    /// * `attempts` - Number of attempts already made (1-indexed).
    pub fn next_delay(&self, attempts: u32) -> Option<Duration> {
        (attempts < self.max_attempts).then_some(self.delay)
    }

    /// Worst-case time spent waiting between attempts.
    pub fn total_delay(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

impl From<&ReadRetryConfig> for RetryPolicy {
    fn from(config: &ReadRetryConfig) -> Self {
        Self::fixed(config.max_attempts, Duration::from_millis(config.delay_ms))
    }
}
