//! Bounded exponential backoff for remote operations.

use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{PublishError, RemoteError};

/// How often and how patiently transient failures are retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

/// The last error of an operation together with how many attempts were made
#[derive(Debug, Clone, PartialEq)]
pub struct RetryFailure {
    pub error: RemoteError,
    pub attempts: u32,
}

impl RetryFailure {
    pub fn into_publish_error(self, operation: &str) -> PublishError {
        PublishError::from_remote(operation, self.attempts, self.error)
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Delay before the retry following failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `f` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Only [RemoteError::is_transient] failures are retried.
    pub fn run<T, F>(&self, operation: &str, mut f: F) -> Result<T, RetryFailure>
    where
        F: FnMut() -> Result<T, RemoteError>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        operation, attempt, max_attempts, error.message, delay
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(error) => {
                    return Err(RetryFailure {
                        error,
                        attempts: attempt,
                    })
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
        }
    }
}
