//! Invocation timeout enforcement.
//!
//! # Responsibilities
//! - Run one attempt against the primary on its own Tokio task
//! - Forward the attempt's items downstream as they arrive
//! - Bound the whole attempt by the invocation timeout
//!
//! # Design Decisions
//! - On timeout the attempt is detached, not cancelled: the item the
//!   forwarder is waiting on still runs to completion, but nothing it
//!   produces reaches the consumer and its outcome is never reported
//! - The forwarder stops polling the primary as soon as nobody listens,
//!   whether the attempt timed out or the consumer went away
//! - A timeout, a source error and a panic while polling the primary are the
//!   same failure to the caller

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::resilience::policy::as_millis_u64;
use crate::resilience::source::Source;
use crate::resilience::types::AttemptError;

/// How one attempt against the primary ended.
#[derive(Debug)]
pub(crate) enum AttemptOutcome<E> {
    /// The primary completed gracefully within the deadline.
    Completed,
    /// The primary failed or ran past the deadline.
    Failed(AttemptError<E>),
    /// The downstream consumer went away mid-attempt.
    Abandoned,
}

/// Subscribe to `primary` once and relay its items into `downstream`.
pub(crate) async fn run_attempt<T, E, P>(
    primary: Arc<P>,
    downstream: &mpsc::UnboundedSender<Result<T, E>>,
    timeout: Duration,
) -> AttemptOutcome<E>
where
    T: Send + 'static,
    E: Send + 'static,
    P: Source<T, E>,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let forwarder = tokio::spawn(async move {
        let mut stream = primary.subscribe();
        while let Some(item) = stream.next().await {
            let terminal = item.is_err();
            // Sends fail once the attempt is detached or abandoned.
            if tx.send(item).is_err() || terminal {
                break;
            }
        }
    });

    let deadline = Instant::now() + timeout;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(Ok(item))) => {
                if downstream.send(Ok(item)).is_err() {
                    return AttemptOutcome::Abandoned;
                }
            }
            Ok(Some(Err(e))) => return AttemptOutcome::Failed(AttemptError::Source(e)),
            Ok(None) => {
                return match forwarder.await {
                    Ok(()) => AttemptOutcome::Completed,
                    Err(e) if e.is_panic() => {
                        tracing::warn!("Primary source panicked");
                        AttemptOutcome::Failed(AttemptError::Panicked)
                    }
                    // Cancelled: the runtime is shutting down.
                    Err(_) => AttemptOutcome::Abandoned,
                };
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = as_millis_u64(timeout),
                    "Primary attempt timed out, detaching"
                );
                return AttemptOutcome::Failed(AttemptError::TimedOut(timeout));
            }
        }
    }
}
