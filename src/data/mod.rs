//! Data acquisition: date ranges, case snapshots, trend tables.

pub mod cases;
pub mod dates;
pub mod trends;

use std::thread;

use tracing::warn;

use crate::domain::RetryPolicy;
use crate::error::AppError;

/// Failure modes a remote source can report.
#[derive(Debug)]
pub enum FetchFailure {
    /// The resource definitively does not exist. Never retried; the caller
    /// treats the day as unavailable and skips it.
    NotFound(String),
    /// A transient transport or server problem. Retried up to the policy
    /// bound with a doubling delay.
    Transient(String),
}

/// Run `op` under the retry policy, converting the terminal failure into a
/// pipeline `Fetch` error named after `resource`.
pub(crate) fn with_retry<T>(
    resource: &str,
    policy: RetryPolicy,
    mut op: impl FnMut() -> Result<T, FetchFailure>,
) -> Result<T, AppError> {
    let attempts = policy.attempts.max(1);
    let mut delay = policy.base_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(FetchFailure::NotFound(reason)) => {
                return Err(AppError::fetch(resource, reason));
            }
            Err(FetchFailure::Transient(reason)) => {
                if attempt >= attempts {
                    return Err(AppError::fetch(resource, reason));
                }
                warn!(resource, attempt, %reason, "fetch failed, retrying");
                thread::sleep(delay);
                delay *= 2;
            }
        }
    }
}
