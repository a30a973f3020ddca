//! Open-state reset timer.
//!
//! # Responsibilities
//! - Schedule the autonomous Open → HalfOpen transition on entry to Open
//! - Guarantee a timer from an earlier Open period never fires
//!
//! # Design Decisions
//! - Runs on the ambient Tokio runtime when there is one, otherwise on a
//!   dedicated thread, so breakers work from synchronous callers too
//! - The task lives on whichever runtime tripped the breaker; if that runtime
//!   shuts down first the breaker stays Open until the next `reset()`
//! - Every arm/cancel bumps a generation; a timer only fires if its
//!   generation is still current

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

#[derive(Debug, Default)]
pub(crate) struct ResetTimer {
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<AbortHandle>>,
    armed: AtomicU64,
}

impl ResetTimer {
    /// Arm the timer; `fire` runs once after `delay` unless re-armed or cancelled first.
    pub(crate) fn arm<F>(&self, delay: Duration, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let armed_at = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.armed.fetch_add(1, Ordering::Relaxed);

        let generation = self.generation.clone();
        let run = move || {
            if generation.load(Ordering::SeqCst) == armed_at {
                fire();
            }
        };

        match Handle::try_current() {
            Ok(handle) => {
                let task = handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    run();
                });
                let previous = self
                    .pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .replace(task.abort_handle());
                if let Some(previous) = previous {
                    previous.abort();
                }
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name("breaker-reset-timer".to_string())
                    .spawn(move || {
                        std::thread::sleep(delay);
                        run();
                    });
                if let Err(e) = spawned {
                    tracing::error!(error = %e, "Failed to spawn reset timer thread");
                }
            }
        }
    }

    /// Drop any pending timer without firing it.
    pub(crate) fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }

    /// Number of times the timer has been armed.
    #[cfg(test)]
    pub(crate) fn armed_count(&self) -> u64 {
        self.armed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_fires_once_after_delay() {
        let timer = ResetTimer::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        timer.arm(Duration::from_millis(20), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.armed_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_suppresses_fire() {
        let timer = ResetTimer::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        timer.arm(Duration::from_millis(20), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rearm_replaces_previous() {
        let timer = ResetTimer::default();
        let fired = Arc::new(AtomicUsize::new(0));

        let f1 = fired.clone();
        timer.arm(Duration::from_millis(20), move || {
            f1.fetch_add(1, Ordering::SeqCst);
        });
        let f2 = fired.clone();
        timer.arm(Duration::from_millis(40), move || {
            f2.fetch_add(10, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
        assert_eq!(timer.armed_count(), 2);
    }

    #[test]
    fn test_fires_without_runtime() {
        let timer = ResetTimer::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        timer.arm(Duration::from_millis(10), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
