//! # Retry Wrapper
//!
//! Bounded exponential-backoff retry around one fallible async operation.
//!
//! ## Key Features
//! - **Classified retry**: only errors for which `VolunteerError::is_retryable`
//!   holds are retried. `blanket_retry` restores retry-on-everything.
//! - **Exponential delay**: `unit × base^attempt`, attempt counted from 0,
//!   capped at `MAX_BACKOFF_DELAY`.
//! - **Transparent failure**: the last error is returned unmodified.

use std::future::Future;
use std::time::Duration;

use log::{debug, error, warn};

use crate::defaults;
use crate::error::{Result, VolunteerError};

/// Upper bound for a single backoff sleep.
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(300);

/// Retry parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Values below 1 act as 1.
    pub max_attempts: u32,
    pub backoff_base: f64,
    pub backoff_unit: Duration,
    /// Retry every failure, not only transient ones.
    pub blanket_retry: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::MAX_ATTEMPTS,
            backoff_base: defaults::BACKOFF_BASE,
            backoff_unit: Duration::from_secs(1),
            blanket_retry: false,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt number `attempt` (from 0).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.backoff_base.powi(exponent);
        if factor.is_nan() || factor < 0.0 {
            return self.backoff_unit.min(MAX_BACKOFF_DELAY);
        }
        Duration::try_from_secs_f64(self.backoff_unit.as_secs_f64() * factor)
            .map_or(MAX_BACKOFF_DELAY, |delay| delay.min(MAX_BACKOFF_DELAY))
    }

    fn should_retry(&self, err: &VolunteerError, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts.max(1) && (self.blanket_retry || err.is_retryable())
    }
}

/// Runs `operation` until it succeeds, fails permanently or the attempts run out.
///
/// `label` names the operation in log lines.
pub async fn execute_with_retry<F, Fut, T>(policy: &RetryPolicy, label: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                debug!("{label}: succeeded on attempt {}/{max_attempts}", attempt + 1);
                return Ok(value);
            }
            Err(e) => {
                if policy.should_retry(&e, attempt) {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        "{label}: attempt {}/{max_attempts} failed ({e}), retrying in {:.1}s",
                        attempt + 1,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                } else {
                    if e.is_retryable() || policy.blanket_retry {
                        error!("{label}: giving up after {} attempt(s): {e}", attempt + 1);
                    } else {
                        error!("{label}: failed with a non-retryable error: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}
