//! Registration backoff.
//!
//! The first wait is `base_backoff` plus a random jitter in
//! `[0, jitter_bound)`; every later wait doubles the previous one with no
//! upper cap. The random source is injected so tests can pin it.

use core_runtime::config::RetryConfig;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Source of the random component added to the first backoff.
pub trait JitterSource: Send + Sync {
    /// A duration in `[0, bound)`; zero when `bound` is zero.
    fn jitter(&self, bound: Duration) -> Duration;
}

/// Jitter drawn from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn jitter(&self, bound: Duration) -> Duration {
        let bound_ms = bound.as_millis().min(u64::MAX as u128) as u64;
        if bound_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..bound_ms))
    }
}

/// Always returns the same jitter, clamped below the bound.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub Duration);

impl JitterSource for FixedJitter {
    fn jitter(&self, bound: Duration) -> Duration {
        if bound.is_zero() {
            Duration::ZERO
        } else {
            self.0.min(bound.saturating_sub(Duration::from_millis(1)))
        }
    }
}

/// Doubling backoff schedule.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Backoff {
    pub fn new(config: &RetryConfig, jitter: &dyn JitterSource) -> Self {
        Self {
            next: config
                .base_backoff
                .saturating_add(jitter.jitter(config.jitter_bound)),
        }
    }

    /// Take the current delay and double the one after it.
    pub fn advance(&mut self) -> Duration {
        let current = self.next;
        self.next = current.saturating_mul(2);
        current
    }
}

/// Sleep for `delay` unless `cancel` fires first.
///
/// Returns `false` when cancelled.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RetryConfig {
        RetryConfig::default()
    }

    #[test]
    fn test_schedule_doubles_from_jittered_base() {
        let mut backoff = Backoff::new(&config(), &FixedJitter(Duration::from_millis(250)));

        assert_eq!(backoff.advance(), Duration::from_millis(2250));
        assert_eq!(backoff.advance(), Duration::from_millis(4500));
        assert_eq!(backoff.advance(), Duration::from_millis(9000));
        assert_eq!(backoff.advance(), Duration::from_millis(18000));
    }

    #[test]
    fn test_schedule_saturates() {
        let config = RetryConfig::default().with_base_backoff(Duration::MAX);
        let mut backoff = Backoff::new(&config, &FixedJitter(Duration::from_millis(1)));

        assert_eq!(backoff.advance(), Duration::MAX);
        assert_eq!(backoff.advance(), Duration::MAX);
    }

    #[test]
    fn test_thread_rng_jitter_stays_in_bound() {
        let bound = Duration::from_millis(1000);
        for _ in 0..200 {
            assert!(ThreadRngJitter.jitter(bound) < bound);
        }
        assert_eq!(ThreadRngJitter.jitter(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_fixed_jitter_is_clamped() {
        let bound = Duration::from_millis(1000);
        assert_eq!(
            FixedJitter(Duration::from_secs(5)).jitter(bound),
            Duration::from_millis(999)
        );
        assert_eq!(FixedJitter(Duration::from_secs(5)).jitter(Duration::ZERO), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_cancel() {
        let cancel = CancellationToken::new();
        assert!(sleep_or_cancel(Duration::from_secs(60), &cancel).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted_by_cancel() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        assert!(!sleep_or_cancel(Duration::from_secs(3600), &cancel).await);
        assert!(started.elapsed() < Duration::from_secs(3600));
    }
}
