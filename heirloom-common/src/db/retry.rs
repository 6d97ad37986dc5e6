//! Database write retry
//!
//! SQLite allows one writer at a time; concurrent submissions can hit
//! transient `database is locked` errors. Writes are wrapped in a bounded
//! exponential backoff that retries lock errors only.

use crate::{Error, Result};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 500;

/// Retry a database operation on lock contention until `max_wait_ms` elapses.
///
/// Lock errors back off exponentially (10ms doubling, capped at 500ms);
/// any other error returns immediately.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start = Instant::now();
    let max_wait = Duration::from_millis(max_wait_ms);
    let mut backoff_ms = INITIAL_BACKOFF_MS;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                let is_lock_error = matches!(
                    &err,
                    Error::Database(db_err) if db_err.to_string().contains("database is locked")
                );

                if !is_lock_error {
                    return Err(err);
                }

                let elapsed = start.elapsed();
                if elapsed >= max_wait {
                    return Err(Error::Internal(format!(
                        "Database locked after {} attempts ({} ms elapsed, max {} ms)",
                        attempt,
                        elapsed.as_millis(),
                        max_wait_ms
                    )));
                }

                warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    "Database locked, will retry after backoff"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}
