//! Retry with exponential backoff for HTTP requests

use std::time::Duration;

use crate::http::HttpError;

/// How many times to retry a transient failure and how long to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// No retries; the first failure is final
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Exponential backoff: base * 2^(attempt-1) (1s, 2s, 4s, ... for the default)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Retry a fallible request with exponential backoff.
///
/// Retryable errors (see [`HttpError::is_retryable`]) are logged at debug and
/// retried up to `policy.max_retries` times. Returns the first success, or the
/// last error on exhaustion / non-retryable error.
pub fn retry_with_backoff<T>(
    label: &str,
    policy: &RetryPolicy,
    mut attempt_fn: impl FnMut() -> Result<T, HttpError>,
) -> Result<T, HttpError> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.max_retries && e.is_retryable() => {
                attempt += 1;
                let delay = policy.backoff_duration(attempt);
                log::debug!(
                    "{label}: attempt {attempt}/{} failed: {e}, retrying in {delay:?}",
                    policy.max_retries
                );
                std::thread::sleep(delay);
            }
            Err(e) => return Err(e),
        }
    }
}
