//! Retry with exponential backoff
//!
//! Used for optimistic-lock conflicts: the operation re-reads the record on
//! every attempt, so a retry observes whatever the competing writer stored.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    /// Cap on the delay between attempts.
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Short backoff for in-process version conflicts.
    pub fn for_conflicts(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            initial_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(50),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Run `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or the attempt budget is spent.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts || !should_retry(&err) => {
                if attempt > 1 {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Operation failed permanently"
                    );
                }
                return Err(err);
            }
            Err(err) => {
                debug!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Retryable failure"
                );

                tokio::time::sleep(delay).await;
                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * config.backoff_multiplier)
                        .min(config.max_delay.as_secs_f64()),
                );
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(
            &RetryConfig::for_conflicts(3),
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("conflict {}", n))
                } else {
                    Ok(n)
                }
            },
            |_| true,
            "test",
        )
        .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            &RetryConfig::for_conflicts(5),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("not found".to_string())
            },
            |_| false,
            "test",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            &RetryConfig::for_conflicts(2),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("conflict".to_string())
            },
            |_| true,
            "test",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
