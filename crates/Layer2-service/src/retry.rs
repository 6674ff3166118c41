//! Retry logic with exponential backoff
//!
//! Delay math lives on `lens_foundation::RetryConfig`; this module decides
//! whether an error is worth another attempt and drives the loop.

use lens_foundation::RetryConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Error classification for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClassification {
    /// Should retry (transient error)
    Retry,

    /// Should not retry (permanent error)
    NoRetry,

    /// Rate limited - use provided delay if available
    RateLimited { retry_after_ms: Option<u64> },
}

/// Trait for errors that can be classified for retry
pub trait RetryableError {
    fn classify(&self) -> RetryClassification;
}

/// Execute an async operation with retry logic.
///
/// The operation runs at most `config.max_retries + 1` times.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: RetryableError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let classification = e.classify();

                match classification {
                    RetryClassification::NoRetry => {
                        debug!(
                            "{}: non-retryable error on attempt {}: {}",
                            operation_name,
                            attempt + 1,
                            e
                        );
                        return Err(e);
                    }
                    RetryClassification::Retry | RetryClassification::RateLimited { .. } => {
                        if attempt >= config.max_retries {
                            warn!(
                                "{}: max retries ({}) exceeded: {}",
                                operation_name, config.max_retries, e
                            );
                            return Err(e);
                        }

                        let delay = match classification {
                            RetryClassification::RateLimited {
                                retry_after_ms: Some(ms),
                            } => Duration::from_millis(ms.min(config.max_delay_ms)),
                            _ => config.delay_for_attempt(attempt),
                        };

                        warn!(
                            "{}: attempt {} failed, retrying in {:?}: {}",
                            operation_name,
                            attempt + 1,
                            delay,
                            e
                        );

                        sleep(delay).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: 1000,
            jitter: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_retried_until_limit() {
        let calls = AtomicU32::new(0);
        let result: Result<(), ServiceError> = with_retry(&fast(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Timeout("slow".into())) }
        })
        .await;

        assert!(matches!(result, Err(ServiceError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), ServiceError> = with_retry(&fast(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Authentication("nope".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ServiceError::RateLimited {
                        retry_after_ms: Some(50),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(1));
    }
}
