//! Utility functions

use anyhow::Result;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// Retry a transport operation with exponential backoff.
///
/// Meant for chat transport calls (file download, sending a reply) that may
/// fail on transient network errors. Backend calls (storage upload,
/// spreadsheet append) are never retried.
///
/// Strategy: 500ms initial delay, 4s max delay, 3 attempts, with jitter.
///
/// # Examples
///
/// ```no_run
/// use expense_bot_core::utils::retry_transport_operation;
/// use anyhow::Result;
///
/// async fn download_file() -> Result<Vec<u8>> {
///     Ok(vec![])
/// }
///
/// # async fn example() -> Result<()> {
/// let bytes = retry_transport_operation(|| download_file()).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error if all attempts fail.
pub async fn retry_transport_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Transport operation failed after {} attempts: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}
