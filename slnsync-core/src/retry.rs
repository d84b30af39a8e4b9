//! Bounded retry with a fixed delay.
//!
//! [`retry`] is the single point where transient failures of the external
//! automation host are absorbed. Callers see either the first success or a
//! [`RetryError`] holding every cause, in attempt order.

use std::fmt;
use std::thread;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// How often and how patiently to call into the external host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `0` behaves like `1`.
    pub max_attempts: u32,
    /// Pause between two attempts. Never applied before the first one.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget, no waiting. Used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Every attempt of `operation` failed.
#[derive(Debug, Error)]
#[error("giving up on {operation} after {} attempts", .causes.len())]
pub struct RetryError<E> {
    pub operation: String,
    /// One cause per attempt, oldest first.
    pub causes: Vec<E>,
}

impl<E: fmt::Display> RetryError<E> {
    /// Log the aggregate and each cause, in order.
    pub fn log(&self) {
        tracing::error!(
            operation = %self.operation,
            attempts = self.causes.len(),
            "{}",
            self
        );
        for (i, cause) in self.causes.iter().enumerate() {
            tracing::error!(attempt = i + 1, "  cause: {cause}");
        }
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` is spent.
pub fn retry<T, E, F>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: fmt::Display,
{
    let attempts = policy.attempts();
    let mut causes = Vec::new();

    for attempt in 1..=attempts {
        if attempt > 1 && !policy.delay.is_zero() {
            thread::sleep(policy.delay);
        }
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "attempt failed"
                );
                causes.push(err);
            }
        }
    }

    Err(RetryError {
        operation: operation.to_string(),
        causes,
    })
}
