//! Bounded exponential backoff for persistence writes. Only errors that
//! look like a transient connection problem are retried; constraint
//! violations and other request-shaped errors propagate on the first
//! attempt so callers can still map them (e.g. a unique-username
//! conflict must never turn into three wasted retries).

use std::future::Future;
use std::time::Duration;

const BACKOFF: [Duration; 3] = [Duration::from_millis(100), Duration::from_millis(400), Duration::from_millis(1600)];

pub async fn with_retry<F, Fut, T>(mut attempt: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut last_err = match attempt().await {
        Ok(v) => return Ok(v),
        Err(e) if !is_retryable(&e) => return Err(e),
        Err(e) => e,
    };
    for delay in BACKOFF {
        tokio::time::sleep(delay).await;
        match attempt().await {
            Ok(v) => return Ok(v),
            Err(e) if !is_retryable(&e) => return Err(e),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

fn is_retryable(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed)
}
