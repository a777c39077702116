use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::RetryPolicy;
use crate::api::FetchError;

/// Result of one fetch, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Success {
        value: T,
    },
    Failure {
        error: FetchError,
        retriable: bool,
        /// How many times the operation ran.
        attempts: u32,
    },
}

impl<T> FetchOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Run `operation` until it succeeds, fails non-retriably, or `policy` runs
/// out of attempts.
///
/// Never panics and never returns an error: every failure is folded into
/// [`FetchOutcome::Failure`]. Cancelling `cancel` interrupts both an in-flight
/// attempt and a pending backoff wait; no attempt starts after cancellation.
pub async fn fetch_with_retry<T, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> FetchOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return cancelled(attempt);
        }
        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(attempt),
            result = operation() => result,
        };

        let error = match result {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Fetch succeeded after retry");
                }
                return FetchOutcome::Success { value };
            }
            Err(error) => error,
        };

        let retriable = error.is_retriable();
        if !retriable {
            debug!(attempt, error = %error, "Fetch failed with non-retriable error");
            return FetchOutcome::Failure {
                error,
                retriable,
                attempts: attempt,
            };
        }
        if attempt >= policy.max_attempts() {
            warn!(attempts = attempt, error = %error, "Fetch retries exhausted");
            return FetchOutcome::Failure {
                error,
                retriable,
                attempts: attempt,
            };
        }

        let delay = policy.backoff(attempt);
        warn!(
            attempt,
            backoff_ms = delay.as_millis() as u64,
            error = %error,
            "Transient fetch failure, backing off"
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(attempt),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

fn cancelled<T>(attempts: u32) -> FetchOutcome<T> {
    debug!(attempts, "Fetch cancelled");
    FetchOutcome::Failure {
        error: FetchError::Cancelled,
        retriable: false,
        attempts,
    }
}
