//! Primary/fallback recovery under a named breaker.
//!
//! # Data Flow
//! ```text
//! subscribe()
//!     → spawn driver task
//!     → attempt primary (timeouts.rs), items forwarded as they arrive
//!     → completed: record success, end stream
//!     → failed or timed out: record failure, then read trip status
//!         → not tripped: attempt primary again
//!         → tripped: relay the fallback once, end stream
//! ```
//!
//! # Design Decisions
//! - Items are never buffered or rolled back: a consumer can see partial
//!   output from failed attempts, repeated once per retry, followed by a
//!   full primary run or the fallback's output
//! - Retries are a loop on one task; only the breaker's threshold bounds them
//! - Every subscription attempts the primary at least once, even while open
//! - The fallback is not protected: its items and its error pass straight through

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::resilience::circuit_breaker::{CircuitBreaker, NextSource};
use crate::resilience::registry::BreakerRegistry;
use crate::resilience::source::{Source, SourceStream};
use crate::resilience::timeouts::{run_attempt, AttemptOutcome};
use crate::resilience::types::BreakerResult;

/// A primary source paired with a fallback under a named breaker.
///
/// `Recover` is itself a [`Source`]; each subscription runs the full
/// retry/redirect protocol independently against the shared breaker.
///
/// # Panics
///
/// [`Source::subscribe`] spawns the driver onto the current Tokio runtime and
/// panics when called outside one. Building a `Recover` needs no runtime.
pub struct Recover<P, F> {
    primary: Arc<P>,
    fallback: Arc<F>,
    breaker: Arc<CircuitBreaker>,
}

impl<P, F> Recover<P, F> {
    /// Pair `primary` with `fallback` under the breaker called `name`.
    ///
    /// Fails immediately if `name` is empty.
    pub fn new(primary: P, fallback: F, registry: &BreakerRegistry, name: &str) -> BreakerResult<Self> {
        let breaker = registry.get_instance(name)?;
        Ok(Self {
            primary: Arc::new(primary),
            fallback: Arc::new(fallback),
            breaker,
        })
    }

    /// The breaker guarding the primary.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl<P, F> std::fmt::Debug for Recover<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recover")
            .field("breaker", &self.breaker.name())
            .finish()
    }
}

impl<T, E, P, F> Source<T, E> for Recover<P, F>
where
    T: Send + 'static,
    E: std::fmt::Display + Send + 'static,
    P: Source<T, E>,
    F: Source<T, E>,
{
    fn subscribe(&self) -> SourceStream<T, E> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drive(
            self.primary.clone(),
            self.fallback.clone(),
            self.breaker.clone(),
            tx,
        ));
        UnboundedReceiverStream::new(rx).boxed()
    }
}

/// Pair `primary` with `fallback` under the breaker called `name`.
pub fn recover<T, E, P, F>(
    primary: P,
    fallback: F,
    registry: &BreakerRegistry,
    name: &str,
) -> BreakerResult<Recover<P, F>>
where
    P: Source<T, E>,
    F: Source<T, E>,
{
    Recover::new(primary, fallback, registry, name)
}

/// Combinator form of [`recover`].
pub trait SourceExt<T, E>: Source<T, E> + Sized {
    /// Fall back to `fallback` whenever the breaker called `name` trips.
    fn recover_with<F>(self, fallback: F, registry: &BreakerRegistry, name: &str) -> BreakerResult<Recover<Self, F>>
    where
        F: Source<T, E>,
    {
        Recover::new(self, fallback, registry, name)
    }
}

impl<T, E, S> SourceExt<T, E> for S where S: Source<T, E> {}

async fn drive<T, E, P, F>(
    primary: Arc<P>,
    fallback: Arc<F>,
    breaker: Arc<CircuitBreaker>,
    downstream: mpsc::UnboundedSender<Result<T, E>>,
) where
    T: Send + 'static,
    E: std::fmt::Display + Send + 'static,
    P: Source<T, E>,
    F: Source<T, E>,
{
    let mut attempt: u32 = 0;
    loop {
        if downstream.is_closed() {
            tracing::debug!(breaker = %breaker.name(), "Consumer gone, stopping");
            return;
        }
        attempt += 1;

        let timeout = breaker.policy().invocation_timeout;
        match run_attempt(primary.clone(), &downstream, timeout).await {
            AttemptOutcome::Completed => {
                breaker.record_success();
                tracing::debug!(breaker = %breaker.name(), attempt, "Primary completed");
                return;
            }
            AttemptOutcome::Failed(e) => {
                tracing::debug!(breaker = %breaker.name(), attempt, error = %e, "Primary attempt failed");
                match breaker.next_source_after_failure() {
                    NextSource::Primary => continue,
                    NextSource::Fallback => {
                        tracing::warn!(
                            breaker = %breaker.name(),
                            attempts = attempt,
                            "Circuit open, switching to fallback"
                        );
                        relay(fallback.as_ref(), &downstream).await;
                        return;
                    }
                }
            }
            AttemptOutcome::Abandoned => {
                tracing::debug!(breaker = %breaker.name(), attempt, "Consumer gone mid-attempt");
                return;
            }
        }
    }
}

/// Forward one subscription of `source` until it ends, fails or the consumer leaves.
async fn relay<T, E, S>(source: &S, downstream: &mpsc::UnboundedSender<Result<T, E>>)
where
    S: Source<T, E>,
{
    let mut stream = source.subscribe();
    while let Some(item) = stream.next().await {
        let terminal = item.is_err();
        if downstream.send(item).is_err() || terminal {
            break;
        }
    }
}
