//! Minimum-interval rate limiter for outbound API calls.
//!
//! Scryfall asks clients to keep 50-100 ms between requests. Each client owns
//! its own limiter, so independent pipelines (and tests) never share state.

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Enforces a minimum delay between consecutive calls.
///
/// The last-call timestamp is held under an async mutex for the whole wait,
/// so concurrent callers through the same limiter are serialized rather than
/// racing on a stale timestamp.
#[derive(Debug)]
pub struct MinIntervalLimiter {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    /// Create a limiter allowing one call per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Minimum spacing between calls.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a call is allowed, then record it.
    ///
    /// Returns how long the caller was delayed.
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last_call.lock().await;

        let mut waited = Duration::ZERO;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.interval {
                waited = self.interval - elapsed;
                debug!("Scryfall rate limit: waiting {:?}", waited);
                sleep(waited).await;
            }
        }

        *last = Some(Instant::now());
        waited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(200));
        let waited = limiter.acquire().await;
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_second_call_waits_for_interval() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(80));

        let start = Instant::now();
        limiter.acquire().await;
        let waited = limiter.acquire().await;

        assert!(waited > Duration::ZERO);
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(20));
        limiter.acquire().await;
        sleep(Duration::from_millis(40)).await;
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_spaced() {
        let limiter = Arc::new(MinIntervalLimiter::new(Duration::from_millis(50)));

        let start = Instant::now();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Three calls need at least two full intervals between them
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_independent_limiters_do_not_interfere() {
        let a = MinIntervalLimiter::new(Duration::from_millis(500));
        let b = MinIntervalLimiter::new(Duration::from_millis(500));

        a.acquire().await;
        assert_eq!(b.acquire().await, Duration::ZERO);
    }
}
