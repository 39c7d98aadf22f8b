// sentri-core/src/infrastructure/adapters/retry.rs

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::domain::config::RetryConfig;
use crate::error::SentriError;

/// Runs `op` until it succeeds or the attempts in `policy` are exhausted.
/// The wait doubles (times `backoff_factor`) after each failure. The last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryConfig,
    label: &str,
    mut op: F,
) -> Result<T, SentriError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SentriError>>,
{
    let attempts = if policy.enabled { policy.max_attempts.max(1) } else { 1 };
    let mut delay_ms = policy.initial_delay_ms as f64;

    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                warn!(
                    operation = label,
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay_ms as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
                delay_ms *= policy.backoff_factor;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            enabled: true,
            max_attempts,
            backoff_factor: 2.0,
            initial_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() -> Result<()> {
        let calls = AtomicU32::new(0);
        let value = retry_with_backoff(&fast(3), "fetch", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(SentriError::InternalError("flaky".into()))
            } else {
                Ok(42)
            }
        })
        .await?;
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let res: Result<(), SentriError> = retry_with_backoff(&fast(2), "fetch", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SentriError::InternalError("down".into()))
        })
        .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_policy_tries_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryConfig {
            enabled: false,
            ..fast(5)
        };
        let _ = retry_with_backoff(&policy, "fetch", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(SentriError::InternalError("down".into()))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
