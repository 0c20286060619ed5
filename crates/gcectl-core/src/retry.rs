//! Exponential backoff for transient provider failures

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::resilience::RetryConfig;
use crate::error::Result;

/// Run `op`, repeating it while it fails with a retryable error
///
/// Only [`CoreError::Transient`](crate::CoreError::Transient) is retried.
/// After `max_attempts` retries the last error is returned unchanged.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_backoff = Duration::from_millis(config.max_backoff_ms);
    let mut backoff = Duration::from_millis(config.backoff_ms).min(max_backoff);
    let mut attempt = 0u32;

    loop {
        match op().await {
            Err(err) if config.enabled && err.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;
                warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    "{} failed: {}; retrying",
                    what,
                    err
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(max_backoff);
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            enabled: true,
            max_attempts,
            backoff_ms: 100,
            max_backoff_ms: 1000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&config(3), "get", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(CoreError::Transient("503".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(&config(2), "get", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::Transient("429".to_string()))
        })
        .await;
        assert!(result.unwrap_err().is_retryable());
        // initial call + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_returns_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(&config(5), "get", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::NotFound("x".to_string()))
        })
        .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_retry() {
        let calls = AtomicU32::new(0);
        let mut cfg = config(5);
        cfg.enabled = false;
        let counter = &calls;
        let result: Result<()> = with_retry(&cfg, "get", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::Transient("500".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_capped() {
        let mut cfg = config(4);
        cfg.max_backoff_ms = 300;
        let start = tokio::time::Instant::now();
        let _: Result<()> = with_retry(&cfg, "get", || async {
            Err(CoreError::Transient("500".to_string()))
        })
        .await;
        // 100 + 200 + 300 + 300
        assert_eq!(start.elapsed(), Duration::from_millis(900));
    }
}
