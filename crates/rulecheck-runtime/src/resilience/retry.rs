//! Bounded retry of transient model failures.
//!
//! Only errors where [`ProviderError::is_transient`] holds are retried.
//! Malformed content is never retried; it goes straight to the fallback.
//! A `retry-after` hint from a rate-limited backend stretches the next
//! delay but never adds attempts.

use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::providers::ProviderError;

/// Exponential backoff matching `config`.
pub fn backoff(config: &RetryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(config.min_delay)
        .with_max_delay(config.max_delay)
        .with_max_times(config.max_retries)
}

/// Run `operation`, retrying transient failures per `config`.
pub async fn retry_transient<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    if config.max_retries == 0 {
        return operation().await;
    }

    operation
        .retry(backoff(config))
        .when(ProviderError::is_transient)
        .adjust(next_delay)
        .notify(|err: &ProviderError, delay| {
            tracing::warn!(error = %err, delay = ?delay, "Transient model failure, retrying");
        })
        .await
}

/// Delay before the next attempt, or `None` once retries are exhausted.
fn next_delay(err: &ProviderError, planned: Option<Duration>) -> Option<Duration> {
    match (err, planned) {
        (
            ProviderError::RateLimited {
                retry_after: Some(wait),
            },
            Some(delay),
        ) => Some(delay.max(*wait)),
        (_, planned) => planned,
    }
}
