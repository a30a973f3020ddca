//! Subscribable data sources.
//!
//! A `Source` is something that can be subscribed to any number of times,
//! each subscription producing a fresh stream of `Result<T, E>` items.
//! An `Ok` item is an emission; an `Err` item is a terminal failure and
//! nothing after it is read; the stream ending is graceful completion.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};

/// One subscription's worth of items.
pub type SourceStream<T, E> = Pin<Box<dyn Stream<Item = Result<T, E>> + Send>>;

/// A re-subscribable stream factory.
pub trait Source<T, E>: Send + Sync + 'static {
    /// Start a new, independent subscription.
    fn subscribe(&self) -> SourceStream<T, E>;
}

impl<T, E, F, S> Source<T, E> for F
where
    T: Send + 'static,
    E: Send + 'static,
    F: Fn() -> S + Send + Sync + 'static,
    S: Stream<Item = Result<T, E>> + Send + 'static,
{
    fn subscribe(&self) -> SourceStream<T, E> {
        (self)().boxed()
    }
}
