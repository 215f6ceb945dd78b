//! Retry and backoff policy for Encar read-API calls.
//!
//! Imports run while a dealer is waiting on the request, so the policy
//! is linear rather than exponential: attempt `n` sleeps
//! `backoff_base_secs * n`, and a 429 with a `Retry-After` header sleeps
//! exactly what the server asked for. Callers bound total wait through
//! `max_retries`.

use std::future::Future;
use std::time::Duration;

use crate::error::EncarError;

/// Whether an error is worth retrying: transport failures, rate
/// limiting, and server-side 5xx are; everything else (bad URL, 404,
/// unparseable body) will fail the same way again.
#[must_use]
pub fn is_retriable(error: &EncarError) -> bool {
    match error {
        EncarError::RateLimited { .. } | EncarError::Http(_) => true,
        EncarError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Runs `op` up to `1 + max_retries` times, sleeping between attempts.
///
/// Non-retriable errors and the final retriable error are returned
/// unchanged.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut op: F,
) -> Result<T, EncarError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EncarError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < max_retries && is_retriable(&error) => {
                let delay_secs = match &error {
                    EncarError::RateLimited {
                        retry_after_secs, ..
                    } => *retry_after_secs,
                    _ => backoff_base_secs.saturating_mul(u64::from(attempt) + 1),
                };
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    delay_secs,
                    error = %error,
                    "retriable Encar API error, backing off"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
