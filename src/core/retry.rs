//! Retry budget and backoff between attempts

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound of the jitter added on top of a computed delay, in percent
const JITTER_PERCENT: u64 = 10;

/// How the wait between attempts grows
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Every wait equals the base delay
    #[default]
    Fixed,
    /// The wait after failed attempt `n` is `delay * factor^(n-1)`, capped at `max_delay`
    Exponential {
        /// Growth factor per failed attempt (values below 1.0 are treated as 1.0)
        factor: f64,
        /// Upper bound for a single wait
        max_delay: Duration,
    },
}

/// Attempt budget and wait policy for one job
///
/// A job is attempted at most `max_retries + 1` times. Between a failed
/// attempt and the next one the executing worker sleeps for
/// [`delay_after`](Self::delay_after); other workers keep running.
///
/// # Example
///
/// ```rust
/// use rust_worker_pool::{Backoff, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3)
///     .with_delay(Duration::from_millis(100))
///     .with_backoff(Backoff::Exponential {
///         factor: 2.0,
///         max_delay: Duration::from_secs(1),
///     });
///
/// assert_eq!(policy.max_attempts(), 4);
/// assert_eq!(policy.delay_after(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_after(3), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base wait between attempts
    pub delay: Duration,
    /// Growth of the wait across attempts
    pub backoff: Backoff,
    /// Add up to 10% random extra wait so retrying jobs spread out
    pub jitter: bool,
}

impl RetryPolicy {
    /// A policy with `max_retries` retries and no wait between attempts
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// A policy that never retries
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the base wait between attempts
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the backoff strategy
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Enable or disable jitter
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts allowed: `max_retries + 1`
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether another attempt follows a failure of `attempt` (1-based)
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }

    /// Wait before the attempt following failed attempt `attempt` (1-based)
    ///
    /// Never shorter than the unjittered value, so consecutive attempts are
    /// always separated by at least `delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let base = match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max_delay } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let scaled = self.delay.as_nanos() as f64 * factor.max(1.0).powi(exponent);
                if scaled.is_finite() && scaled < max_delay.as_nanos() as f64 {
                    Duration::from_nanos(scaled.round() as u64).max(self.delay)
                } else {
                    max_delay.max(self.delay)
                }
            }
        };

        if self.jitter && !base.is_zero() {
            let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
            let span_ms = base_ms.saturating_mul(JITTER_PERCENT) / 100;
            base.saturating_add(Duration::from_millis(fastrand::u64(0..=span_ms)))
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_budget() {
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
        assert_eq!(RetryPolicy::new(2).max_attempts(), 3);
        assert_eq!(RetryPolicy::new(u32::MAX).max_attempts(), u32::MAX);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::new(2);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicy::new(5).with_delay(Duration::from_millis(10));
        for attempt in 1..=5 {
            assert_eq!(policy.delay_after(attempt), Duration::from_millis(10));
        }
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let policy = RetryPolicy::new(10)
            .with_delay(Duration::from_millis(100))
            .with_backoff(Backoff::Exponential {
                factor: 2.0,
                max_delay: Duration::from_millis(500),
            });

        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
        assert_eq!(policy.delay_after(4), Duration::from_millis(500));
        assert_eq!(policy.delay_after(60), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_never_shortens_delay() {
        let policy = RetryPolicy::new(3)
            .with_delay(Duration::from_millis(100))
            .with_jitter(true);

        for _ in 0..100 {
            let delay = policy.delay_after(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(110));
        }
    }

    #[test]
    fn test_jitter_saturates_on_huge_delay() {
        let policy = RetryPolicy::new(1)
            .with_delay(Duration::MAX)
            .with_jitter(true);

        assert_eq!(policy.delay_after(1), Duration::MAX);
    }
}
