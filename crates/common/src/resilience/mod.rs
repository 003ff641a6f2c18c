//! Resilience primitives for the client core.

pub mod retry;

pub use retry::{run_with_schedule, BackoffSchedule, RetryDecision, RetryError, RetryPolicy};
