use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::warn;

/// Bounded retry policy with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one
    pub base_delay: Duration,
    /// Upper bound for any single delay, including provider hints
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Backoff before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1))
    }
}

/// Runs `f` until it succeeds, the error is not retryable, or the budget is spent
///
/// `should_retry` decides per error; `hint` may supply a provider-suggested delay which
/// replaces the computed backoff (still capped by `max_delay`).
pub async fn with_retry<F, Fut, T, E, R, H>(
    policy: RetryPolicy,
    mut f: F,
    should_retry: R,
    hint: H,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    H: Fn(&E) -> Option<Duration>,
    E: std::fmt::Display,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if retries >= policy.max_retries || !should_retry(&e) {
                    return Err(e);
                }
                retries += 1;
                let delay = hint(&e)
                    .map(|d| d.min(policy.max_delay))
                    .unwrap_or_else(|| policy.delay_for(retries));
                warn!(
                    "Attempt {} failed: {}; retrying in {:?}",
                    retries, e, delay
                );
                sleep(delay).await;
            }
        }
    }
}
