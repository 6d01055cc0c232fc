//! Bounded retry for transient model transport failures.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

/// Initial backoff; doubles per attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(250);

/// Run `op` up to `1 + max_retries` times, retrying only transient
/// failures (connection errors, timeouts). A response that came back but
/// failed to decode is returned immediately; repeating the identical
/// request cannot fix it.
pub async fn with_retries<F, Fut, T>(max_retries: u32, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let attempts = max_retries.saturating_add(1);
    let mut backoff = BASE_BACKOFF;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                tracing::warn!(
                    attempt,
                    error = %e,
                    "Transient model call failure, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) if e.is_transient() => {
                return Err(LlmError::RetriesExhausted {
                    attempts,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("retry loop always returns")
}
