//! Bounded exponential backoff for outbound deliveries.
//!
//! The default policy makes exactly one attempt. Raising
//! `delivery.retry.max_attempts` enables retries, which changes how long a
//! failing exchange takes to finish.

use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::warn;

use relay_core::{config::RetryConfig, DeliveryAttempt};

/// Jitter fraction applied to each delay (up to +10 %).
const JITTER_FRACTION: f64 = 0.10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// One attempt, no backoff.
    pub fn single() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// Returns the last attempt's outcome. Schedule: base → 2×base → … capped
    /// at `max_delay`, each with up to 10 % jitter.
    pub async fn run<F, Fut>(&self, mut op: F) -> DeliveryAttempt
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DeliveryAttempt>,
    {
        let mut delay = self.base_delay;
        let mut attempt_no = 1;

        loop {
            let attempt = op().await;
            if attempt.succeeded || attempt_no >= self.max_attempts {
                return attempt;
            }

            let wait = delay + jitter(delay);
            warn!(
                target_url = %attempt.target,
                attempt = attempt_no,
                max = self.max_attempts,
                error = attempt.error.as_deref().unwrap_or(""),
                retry_after_ms = wait.as_millis() as u64,
                "delivery failed, retrying with backoff"
            );
            sleep(wait).await;
            delay = (delay * 2).min(self.max_delay);
            attempt_no += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single()
    }
}

/// Clock-derived jitter offset in `0 .. JITTER_FRACTION * base`.
fn jitter(base: Duration) -> Duration {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let max_jitter = (base.as_millis() as f64 * JITTER_FRACTION) as u64;
    if max_jitter == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(nanos as u64 % max_jitter)
}
