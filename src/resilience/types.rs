//! Resilience error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by breaker lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreakerError {
    /// Registry lookup with an empty breaker name.
    #[error("circuit breaker name must not be empty")]
    EmptyName,
}

/// Result type for breaker operations.
pub type BreakerResult<T> = Result<T, BreakerError>;

/// Why a single attempt against the primary failed.
///
/// Every variant is reported to the breaker as the same failure; the
/// distinction only shows up in logs.
#[derive(Debug, Error)]
pub enum AttemptError<E> {
    /// The primary emitted an error item.
    #[error("primary source failed: {0}")]
    Source(E),

    /// The primary did not complete within the invocation timeout.
    #[error("primary source timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// Polling the primary panicked.
    #[error("primary source panicked")]
    Panicked,
}
