//! Bounded, retryable invocation of external operations.
//!
//! Every saga step goes through a [`StepInvoker`]: one logical operation
//! becomes a series of attempts, each bounded by a per-attempt timeout,
//! separated by exponential backoff. Failures carry a classification, and
//! a non-retryable failure surfaces immediately regardless of policy.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::error::{Result, SagaError};

/// Classification of a step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transient failure; the invoker retries it per policy.
    Retryable,
    /// Business failure; never retried.
    NonRetryable,
}

/// A classified failure returned by an external operation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StepFailure {
    /// Creates a retryable (transient) failure.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Retryable,
            message: message.into(),
        }
    }

    /// Creates a non-retryable (business) failure.
    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NonRetryable,
            message: message.into(),
        }
    }
}

/// Exponential backoff policy applied to retryable failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_coefficient: f64,
    /// Upper bound on the delay between retries.
    pub maximum_interval: Duration,
    /// Attempt budget; 0 means unbounded.
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(30),
            maximum_attempts: 0,
        }
    }
}

impl RetryPolicy {
    fn next_backoff(&self, current: Duration) -> Duration {
        current
            .mul_f64(self.backoff_coefficient)
            .min(self.maximum_interval)
    }

    fn attempts_exhausted(&self, attempt: u32) -> bool {
        self.maximum_attempts != 0 && attempt >= self.maximum_attempts
    }
}

/// Options governing one step invocation.
#[derive(Debug, Clone)]
pub struct StepOptions {
    /// Per-attempt timeout; an attempt exceeding it counts as a
    /// retryable failure.
    pub timeout: Duration,
    /// Retry policy applied to retryable failures.
    pub retry: RetryPolicy,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// Executes named operations with bounded timeouts and retries.
#[derive(Debug, Clone, Default)]
pub struct StepInvoker {
    options: StepOptions,
}

impl StepInvoker {
    /// Creates an invoker with the given options.
    pub fn new(options: StepOptions) -> Self {
        Self { options }
    }

    /// Invokes `call` until it succeeds, fails non-retryably, or the
    /// retry policy's attempt budget runs out. Each attempt is bounded
    /// by the per-attempt timeout.
    pub async fn invoke<T, F, Fut>(&self, step: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StepFailure>>,
    {
        let retry = &self.options.retry;
        let mut attempt: u32 = 1;
        let mut backoff = retry.initial_interval;

        loop {
            let failure = match tokio::time::timeout(self.options.timeout, call()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        tracing::info!(step, attempt, "step succeeded after retries");
                    }
                    return Ok(value);
                }
                Ok(Err(failure)) => failure,
                Err(_) => StepFailure::retryable(format!(
                    "attempt timed out after {:?}",
                    self.options.timeout
                )),
            };

            if failure.kind == FailureKind::NonRetryable {
                tracing::warn!(step, attempt, error = %failure, "step failed, not retryable");
                return Err(SagaError::Step {
                    step,
                    attempts: attempt,
                    source: failure,
                });
            }

            if retry.attempts_exhausted(attempt) {
                tracing::warn!(step, attempt, error = %failure, "step retries exhausted");
                return Err(SagaError::Step {
                    step,
                    attempts: attempt,
                    source: failure,
                });
            }

            tracing::debug!(
                step,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %failure,
                "step failed, retrying"
            );
            tokio::time::sleep(backoff).await;
            backoff = retry.next_backoff(backoff);
            attempt += 1;
        }
    }
}
