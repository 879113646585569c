//! Retry logic.
//!
//! # Responsibilities
//! - Run an attempt up to `max_attempts` times
//! - Sleep the configured backoff between attempts
//! - Let an attempt abort the loop when retrying cannot help
//!
//! # Design Decisions
//! - Only callers issuing idempotent requests go through this loop
//! - The first attempt counts toward `max_attempts`

use std::future::Future;
use std::time::Duration;

use crate::config::{BackoffStrategy, RetryConfig};
use crate::resilience::backoff::delay_for;

/// How many times and how far apart an idempotent request is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub strategy: BackoffStrategy,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            strategy: BackoffStrategy::Fixed,
        }
    }

    /// Delay to sleep before retry number `retry` (1 = first retry).
    pub fn delay_before(&self, retry: u32) -> Duration {
        delay_for(self.strategy, retry, self.base_delay_ms, self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            strategy: config.strategy,
        }
    }
}

/// Failure of a single attempt.
#[derive(Debug)]
pub enum Attempt<E> {
    /// Transient failure; try again if budget remains. `status` is the
    /// HTTP status when the server answered at all.
    Retry { status: Option<u16>, message: String },
    /// Permanent failure; stop immediately.
    Abort(E),
}

impl<E> Attempt<E> {
    /// Transient failure without a response (connect error, timeout).
    pub fn network(message: impl Into<String>) -> Self {
        Attempt::Retry {
            status: None,
            message: message.into(),
        }
    }
}

/// Final failure of a retried operation.
#[derive(Debug)]
pub enum RetryFailure<E> {
    Exhausted {
        attempts: u32,
        last_status: Option<u16>,
        last_error: String,
    },
    Aborted(E),
}

/// Run `op` until it succeeds, aborts, or the attempt budget is spent.
///
/// `op` receives the 1-based attempt number.
pub async fn run_with_retries<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_status = None;
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.delay_before(attempt - 1)).await;
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(Attempt::Abort(e)) => return Err(RetryFailure::Aborted(e)),
            Err(Attempt::Retry { status, message }) => {
                tracing::warn!(
                    target_url = label,
                    attempt,
                    max_attempts,
                    status = ?status,
                    error = %message,
                    "Request attempt failed"
                );
                last_status = status;
                last_error = message;
            }
        }
    }

    Err(RetryFailure::Exhausted {
        attempts: max_attempts,
        last_status,
        last_error,
    })
}
