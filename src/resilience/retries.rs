//! Retry logic for connection establishment.
//!
//! # Responsibilities
//! - Run an operation up to a bounded number of attempts
//! - Sleep a fixed delay between failed attempts
//! - Report the attempt count alongside the last failure
//!
//! # Design Decisions
//! - The first attempt counts toward the bound
//! - No delay after the final failed attempt or after a success
//! - Only connection establishment is retried, never decoding

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    wait: Duration,
}

/// Failure of every attempt under a [`RetryPolicy`].
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Attempts made before giving up.
    pub attempts: u32,
    /// Error of the last attempt.
    pub last_error: E,
}

impl RetryPolicy {
    /// Create a policy; an attempt bound of zero is treated as one.
    pub fn new(attempts: u32, wait: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            wait,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Run `op` until it succeeds or the attempt bound is reached.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.run_while(op, |_| true).await
    }

    /// Like [`run`](Self::run), but stops early on an error `retryable` rejects.
    pub async fn run_while<T, E, F, Fut, R>(&self, mut op: F, retryable: R) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        R: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.attempts || !retryable(&e) => {
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.attempts,
                        wait_ms = u64::try_from(self.wait.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    if !self.wait.is_zero() {
                        tokio::time::sleep(self.wait).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.attempts, config.wait())
    }
}
