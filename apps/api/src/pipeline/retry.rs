//! Bounded retry with a fixed delay, shared by both oracle call sites.
//!
//! The scoring stage runs with `RetryPolicy::single_attempt()` (first failure is
//! fatal for the run); the comparison stage with `RetryPolicy::fixed(3, 2s)`.
//! No exponential backoff, no jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Treated as at least 1.
    pub max_attempts: u32,
    /// Pause between two consecutive attempts.
    pub delay: Duration,
}

/// The last error once a policy gives up, with the number of attempts made.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub source: E,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub const fn single_attempt() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Runs `op` until it succeeds, the error is not retryable, or the attempt
    /// budget is spent. `op` is called again from scratch on every attempt.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        label: &str,
        is_retryable: P,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts && is_retryable(&e) => {
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        "{label} failed, retrying: {e}"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}
