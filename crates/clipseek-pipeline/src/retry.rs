//! Retry with linear backoff for rate-limited model calls.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::cancel::CancelSignal;
use crate::error::PipelineResult;

/// Linear-backoff retry policy: attempt `i` (zero-based) waits `i * delay`
/// before running, so attempts land at 0, `delay`, `2 * delay`, ...
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.delay * attempt
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Success(T),
    Exhausted { error: E, attempts: u32 },
}

/// Run `operation` under `policy`. Backoff sleeps wake early on
/// cancellation, which surfaces as the pipeline's cancellation error.
pub async fn retry_linear<F, Fut, T, E>(
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    operation_name: &str,
    operation: F,
) -> PipelineResult<RetryOutcome<T, E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            cancel.sleep(policy.delay_for_attempt(attempt)).await?;
        }
        cancel.check()?;

        match operation().await {
            Ok(value) => return Ok(RetryOutcome::Success(value)),
            Err(e) => {
                debug!(
                    "{} attempt {}/{} failed: {}",
                    operation_name,
                    attempt + 1,
                    attempts,
                    e
                );
                last_error = Some(e);
            }
        }
    }

    Ok(RetryOutcome::Exhausted {
        error: last_error.expect("at least one attempt ran"),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_delays_are_linear() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(0));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_eventual_success() {
        let calls = AtomicU32::new(0);
        let outcome = retry_linear(&fast_policy(3), &CancelSignal::never(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient")
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert!(matches!(outcome, RetryOutcome::Success(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts() {
        let outcome = retry_linear(&fast_policy(3), &CancelSignal::never(), "test", || async {
            Err::<(), _>("permanent")
        })
        .await
        .unwrap();

        match outcome {
            RetryOutcome::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
            RetryOutcome::Success(_) => panic!("expected exhaustion"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_retries() {
        let (handle, signal) = crate::cancel::cancel_pair();
        handle.cancel();

        let result = retry_linear(
            &RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_secs(3600),
            },
            &signal,
            "test",
            || async { Err::<(), _>("never retried") },
        )
        .await;

        assert!(result.is_err());
    }
}
