use std::{future::Future, time::Duration};

use crate::{common::errors::RelayError, configs::RelayConfig};

/// Per-operation retry schedule: `base`, `2 * base`, `4 * base` ... capped at
/// `max`, for at most `max_retries` retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    attempt: u32,
    max_retries: u32,
    base: Duration,
    max: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base: Duration, max: Duration) -> Self {
        Self {
            attempt: 0,
            max_retries,
            base,
            max,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_ms),
            Duration::from_millis(config.retry_max_ms),
        )
    }

    /// Delay before the next retry, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let factor = 2u32.saturating_pow(self.attempt.min(16));
        self.attempt += 1;
        Some(self.base.saturating_mul(factor).min(self.max))
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_retries
    }

    /// Attempts made so far, counting the first one.
    pub fn attempts(&self) -> u32 {
        self.attempt + 1
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// policy runs out. The policy is consumed, so every call starts a fresh budget.
pub async fn retry_transient<T, F, Fut>(
    mut policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RelayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RelayError>>,
{
    policy.reset();
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => e,
            Err(e) => return Err(e),
        };

        match policy.next_delay() {
            Some(delay) => {
                tracing::warn!(
                    "{} failed (attempt {}), retrying in {:?}: {}",
                    label,
                    policy.attempt,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                return Err(RelayError::RetriesExhausted {
                    attempts: policy.attempts(),
                    last_error: err.to_string(),
                });
            }
        }
    }
}
