//! Fixed-schedule retry
//!
//! The transfer layer retries on a fixed delay schedule (0s, 3s, 5s, 10s,
//! 20s by default) rather than computed backoff: the attempt budget and the
//! waiting pattern are part of the upload protocol's observable behavior,
//! so they are data, not a formula.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use mediadesk_domain::constants::CHUNK_BACKOFF_SECS;

/// Errors produced by the retry executor
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt on the schedule failed; carries the last error
    #[error("all retry attempts exhausted after {attempts} tries: {source}")]
    AttemptsExhausted { attempts: u32, source: E },

    /// The operation failed with an error the policy refuses to retry
    #[error("operation failed with non-retryable error: {source}")]
    NonRetryable { source: E },
}

impl<E> RetryError<E> {
    /// The error produced by the final attempt.
    pub fn into_source(self) -> E {
        match self {
            Self::AttemptsExhausted { source, .. } | Self::NonRetryable { source } => source,
        }
    }
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the next delay on the schedule
    Retry,
    /// Don't retry the operation
    Stop,
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Classify the error for the given (0-based) attempt number.
    fn classify(&self, error: &E, attempt: u32) -> RetryDecision;
}

impl<E, F> RetryPolicy<E> for F
where
    F: Fn(&E) -> RetryDecision,
{
    fn classify(&self, error: &E, _attempt: u32) -> RetryDecision {
        self(error)
    }
}

/// A fixed list of delays applied between attempts.
///
/// An operation run against a schedule of N delays makes at most N + 1
/// attempts: the initial one plus one retry per delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
}

impl BackoffSchedule {
    #[must_use]
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Build a schedule from whole seconds (the config representation).
    #[must_use]
    pub fn from_secs(secs: &[u64]) -> Self {
        Self::new(secs.iter().copied().map(Duration::from_secs).collect())
    }

    #[must_use]
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Total attempts permitted (initial try + one per delay).
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::from_secs(CHUNK_BACKOFF_SECS)
    }
}

/// Run an operation with retries on the given schedule.
///
/// # Errors
/// Returns [`RetryError::NonRetryable`] when the policy stops the retry
/// loop, or [`RetryError::AttemptsExhausted`] when the schedule runs dry.
pub async fn run_with_schedule<P, F, Fut, T, E>(
    schedule: &BackoffSchedule,
    policy: &P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    P: RetryPolicy<E>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => match policy.classify(&error, attempt) {
                RetryDecision::Stop => return Err(RetryError::NonRetryable { source: error }),
                RetryDecision::Retry => {
                    let Some(delay) = schedule.delays().get(attempt as usize).copied() else {
                        return Err(RetryError::AttemptsExhausted {
                            attempts: attempt + 1,
                            source: error,
                        });
                    };

                    debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = ?error,
                        "retrying after backoff"
                    );

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            },
        }
    }
}
