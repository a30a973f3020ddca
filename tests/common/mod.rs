//! Scripted sources shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use circuit_recovery::{Source, SourceStream};
use futures_util::{stream, StreamExt};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TestError(pub &'static str);

pub type Item = Result<i32, TestError>;

/// Emits `1, 1` and completes.
pub fn successful() -> impl Source<i32, TestError> {
    || stream::iter(vec![Ok::<_, TestError>(1), Ok(1)])
}

/// Emits `1` and fails.
pub fn failing() -> impl Source<i32, TestError> {
    || stream::iter(vec![Ok(1), Err(TestError("Failed!"))])
}

/// Emits `1`, waits `delay`, emits `1` and completes.
pub fn successful_with_delay(delay: Duration) -> impl Source<i32, TestError> {
    move || {
        stream::once(async { Ok::<_, TestError>(1) }).chain(stream::once(async move {
            tokio::time::sleep(delay).await;
            Ok(1)
        }))
    }
}

/// Emits `value` and then never completes.
pub fn hanging(value: i32) -> impl Source<i32, TestError> {
    move || stream::once(async move { Ok::<_, TestError>(value) }).chain(stream::pending())
}

/// Emits `1`, then panics while producing the next item.
pub fn panicking() -> impl Source<i32, TestError> {
    || {
        stream::iter(vec![1, 2]).map(|n| {
            if n == 2 {
                panic!("primary crashed");
            }
            Ok::<_, TestError>(n)
        })
    }
}

/// Emits an item every `tick` forever; the counter tracks items produced.
pub fn endless(tick: Duration) -> (impl Source<i32, TestError>, Arc<AtomicU32>) {
    let produced = Arc::new(AtomicU32::new(0));
    let counter = produced.clone();
    let source = move || {
        let counter = counter.clone();
        stream::unfold(0, move |n| {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(tick).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Some((Ok::<_, TestError>(n), n + 1))
            }
        })
    };
    (source, produced)
}

/// Emits `0, 0` and completes.
pub fn alternate() -> impl Source<i32, TestError> {
    || stream::iter(vec![Ok::<_, TestError>(0), Ok(0)])
}

/// Wraps a source and counts its subscriptions.
pub struct Counting<S> {
    inner: S,
    subscriptions: Arc<AtomicU32>,
}

impl<S> Counting<S> {
    pub fn new(inner: S) -> (Self, Arc<AtomicU32>) {
        let subscriptions = Arc::new(AtomicU32::new(0));
        (
            Self {
                inner,
                subscriptions: subscriptions.clone(),
            },
            subscriptions,
        )
    }
}

impl<S> Source<i32, TestError> for Counting<S>
where
    S: Source<i32, TestError>,
{
    fn subscribe(&self) -> SourceStream<i32, TestError> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribe()
    }
}

/// Emits `1, 2` and fails for the first `failures` subscriptions, then emits `1, 2, 3`.
pub fn flaky_then_healthy(failures: u32) -> impl Source<i32, TestError> {
    let calls = Arc::new(AtomicU32::new(0));
    move || {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        if call < failures {
            stream::iter(vec![Ok(1), Ok(2), Err(TestError("flaky"))])
        } else {
            stream::iter(vec![Ok(1), Ok(2), Ok(3)])
        }
    }
}

/// Subscribe once and gather everything the consumer sees.
pub async fn collect<S>(source: &S) -> Vec<Item>
where
    S: Source<i32, TestError>,
{
    source.subscribe().collect().await
}

/// Just the values, for sources that never end in an error.
pub fn values(items: &[Item]) -> Vec<i32> {
    items
        .iter()
        .map(|item| match item {
            Ok(v) => *v,
            Err(e) => panic!("unexpected error item: {}", e),
        })
        .collect()
}

/// Sleep, then let any timer tasks that became due run first.
pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    tokio::task::yield_now().await;
}
