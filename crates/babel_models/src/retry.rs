//! Exponential backoff for transient backend errors.

use babel_error::{GenerationError, RetryableError};
use std::future::Future;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{info, warn};

/// How hard to retry transient backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying
    pub max_retries: usize,
    /// Initial backoff; overrides the error-specific default when set
    pub initial_backoff_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: None,
        }
    }
}

/// Run `operation`, retrying transient [`GenerationError`]s with jittered
/// exponential backoff. Permanent errors return immediately.
///
/// The first failure decides the strategy via [`RetryableError::retry_strategy_params`];
/// the policy's initial backoff and retry count override those defaults.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let first = match operation().await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if policy.max_retries == 0 || !first.is_retryable() {
        warn!(operation = operation_name, error = %first, "Permanent backend error, failing immediately");
        return Err(first);
    }

    let (default_ms, _, max_delay_secs) = first.retry_strategy_params();
    let initial_ms = policy.initial_backoff_ms.unwrap_or(default_ms);
    info!(
        operation = operation_name,
        error = %first,
        initial_backoff_ms = initial_ms,
        max_retries = policy.max_retries,
        "Backend call failed, will retry"
    );

    let strategy = ExponentialBackoff::from_millis(initial_ms)
        .factor(2)
        .max_delay(Duration::from_secs(max_delay_secs))
        .map(jitter)
        .take(policy.max_retries);

    Retry::spawn(strategy, || {
        let attempt = operation();
        async move {
            match attempt.await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!(operation = operation_name, error = %e, "Transient backend error, retrying");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => Err(RetryError::Permanent(e)),
            }
        }
    })
    .await
}
