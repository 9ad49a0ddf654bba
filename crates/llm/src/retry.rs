//! Bounded retry with exponential backoff for external network calls.
//!
//! Every outbound call (completion, embedding, mail, search) is expected to
//! either succeed, fail within its timeout, or exhaust its retries; callers
//! then surface a degraded-service message instead of a raw failure.

use pathway_core::AppResult;
use std::future::Future;
use std::time::Duration;

/// Base delay before the first retry; doubles on each subsequent attempt.
const INITIAL_BACKOFF_MS: u64 = 200;

/// Run `op`, retrying up to `max_retries` times on failure.
///
/// Total attempts = `max_retries + 1`. Backoff is exponential starting at
/// 200ms. The last error is returned when all attempts fail.
pub async fn with_retry<T, F, Fut>(label: &str, max_retries: u32, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries => {
                let delay = Duration::from_millis(INITIAL_BACKOFF_MS << attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    label,
                    attempt + 1,
                    max_retries + 1,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(
                    "{} failed after {} attempts: {}",
                    label,
                    max_retries + 1,
                    err
                );
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = with_retry("op", 2, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, AppError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_retry("op", 2, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AppError::Llm("transient".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = with_retry("op", 2, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::Llm("down".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3); // 1 attempt + 2 retries
    }
}
