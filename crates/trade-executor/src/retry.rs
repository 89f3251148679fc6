//! Bounded retry around a whole trade.

use std::future::Future;

use tracing::{error, warn};

use crate::config::RetryPolicy;
use crate::error::{RetryExhausted, TradeError};

/// Run `operation` until it succeeds or the attempt budget is spent.
///
/// Waits `initial_delay` first. The first failure is logged in full; every
/// failure followed by another attempt logs a one-line notice. A fatal error
/// (see [`TradeError::is_fatal`]) ends the loop at once. The closure receives
/// the 1-based attempt number.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, TradeError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut first_error: Option<TradeError> = None;

    tokio::time::sleep(policy.initial_delay).await;

    let mut attempt = 0;
    loop {
        attempt += 1;

        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if first_error.is_none() {
            error!(attempt, error = %err, detail = ?err, "Trade attempt failed");
            first_error = Some(err.clone());
        }
        if err.is_fatal() || attempt >= max_attempts {
            return Err(RetryExhausted {
                attempts: attempt,
                first_error: first_error.unwrap_or_else(|| err.clone()),
                last_error: err,
            });
        }
        warn!(attempt, max_attempts, "Trade failed, trying again");

        if !policy.between_attempts.is_zero() {
            tokio::time::sleep(policy.between_attempts).await;
        }
    }
}
