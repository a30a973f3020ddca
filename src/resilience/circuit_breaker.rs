//! Circuit breaker guarding a primary source.
//!
//! # Responsibilities
//! - Own the current state, its counters and the policy
//! - Accept success/failure reports and apply the resulting transitions
//! - Tell the recovery loop whether to retry the primary or use the fallback
//!
//! # Design Decisions
//! - No lock on the hot path: state is an `AtomicU8`, counters are atomics
//! - A transition is a compare-and-swap from the expected state; only the
//!   winner runs the entry hook, so each logical transition enters once
//! - Reports go to whatever state is current when they land; reading the
//!   trip status always happens after the report

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::resilience::policy::{as_millis_u64, Policy};
use crate::resilience::state::{CircuitState, Trigger};
use crate::resilience::timer::ResetTimer;

/// Outcome of one operation against the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

/// Which source the caller should consume next after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextSource {
    /// Breaker still lets calls through: subscribe to the primary again.
    Primary,
    /// Breaker is tripped: subscribe to the fallback.
    Fallback,
}

/// A named circuit breaker.
///
/// Shared via `Arc`; all methods take `&self`.
pub struct CircuitBreaker {
    name: String,
    policy: ArcSwap<Policy>,
    state: AtomicU8,
    /// Consecutive failures while closed.
    consecutive_failures: AtomicU32,
    /// Consecutive successes while half-open.
    consecutive_successes: AtomicU32,
    reset_timer: ResetTimer,
    this: Weak<CircuitBreaker>,
}

impl CircuitBreaker {
    /// Create a closed breaker holding a copy of `policy`.
    pub fn new(name: impl Into<String>, policy: Policy) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            name: name.into(),
            policy: ArcSwap::from_pointee(policy),
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            reset_timer: ResetTimer::default(),
            this: this.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::SeqCst))
    }

    /// Snapshot of the current policy values.
    pub fn policy(&self) -> Policy {
        **self.policy.load()
    }

    /// Overwrite this breaker's policy values.
    ///
    /// Every holder of the breaker observes the new values on its next read;
    /// an Open timer already armed keeps the dwell time it was armed with.
    pub fn apply_policy(&self, policy: Policy) {
        self.policy.store(Arc::new(policy));
        tracing::info!(
            breaker = %self.name,
            max_errors = policy.max_errors,
            required_successes_to_close = policy.required_successes_to_close,
            circuit_reset_timeout_ms = as_millis_u64(policy.circuit_reset_timeout),
            invocation_timeout_ms = as_millis_u64(policy.invocation_timeout),
            "Policy applied"
        );
    }

    /// True only while open.
    pub fn is_tripped(&self) -> bool {
        self.state().is_tripped()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes.load(Ordering::SeqCst)
    }

    /// Report a successful operation.
    pub fn record_success(&self) {
        self.report(Outcome::Success);
    }

    /// Report a failed (or timed-out) operation.
    pub fn record_failure(&self) {
        self.report(Outcome::Failure);
    }

    /// Report a failure, then decide where the caller goes next.
    pub fn next_source_after_failure(&self) -> NextSource {
        self.record_failure();
        if self.is_tripped() {
            NextSource::Fallback
        } else {
            NextSource::Primary
        }
    }

    /// Force the breaker closed, discarding any pending reset timer.
    pub fn reset(&self) {
        self.reset_timer.cancel();
        let previous = CircuitState::from(
            self.state.swap(CircuitState::Closed as u8, Ordering::SeqCst),
        );
        self.enter(CircuitState::Closed);
        if previous != CircuitState::Closed {
            tracing::info!(breaker = %self.name, from = %previous, to = %CircuitState::Closed, "Circuit breaker reset");
        }
    }

    /// Point-in-time view for reporting.
    pub fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            name: self.name.clone(),
            state: self.state(),
            policy: self.policy(),
            consecutive_failures: self.consecutive_failures(),
            consecutive_successes: self.consecutive_successes(),
        }
    }

    fn report(&self, outcome: Outcome) {
        let from = self.state();
        let trigger = match (from, outcome) {
            (CircuitState::Open, _) => return,
            (CircuitState::Closed, Outcome::Success) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                return;
            }
            // The failure counter is not consulted in half-open and is
            // cleared again on entry to Closed.
            (CircuitState::Closed | CircuitState::HalfOpen, Outcome::Failure) => Trigger::Failure {
                consecutive: self.consecutive_failures.fetch_add(1, Ordering::SeqCst).wrapping_add(1),
            },
            (CircuitState::HalfOpen, Outcome::Success) => Trigger::Success {
                consecutive: self.consecutive_successes.fetch_add(1, Ordering::SeqCst).wrapping_add(1),
            },
        };

        tracing::debug!(breaker = %self.name, state = %from, ?trigger, "Outcome reported");

        if let Some(to) = from.on(trigger, &self.policy()) {
            self.transition(from, to);
        }
    }

    /// Swap `from` → `to`; returns false if another caller got there first.
    fn transition(&self, from: CircuitState, to: CircuitState) -> bool {
        let swapped = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        if swapped {
            self.enter(to);
            tracing::info!(breaker = %self.name, from = %from, to = %to, "Circuit breaker state changed");
        }
        swapped
    }

    fn enter(&self, state: CircuitState) {
        match state {
            CircuitState::Closed => self.consecutive_failures.store(0, Ordering::SeqCst),
            CircuitState::HalfOpen => self.consecutive_successes.store(0, Ordering::SeqCst),
            CircuitState::Open => {
                let this = self.this.clone();
                self.reset_timer.arm(self.policy().circuit_reset_timeout, move || {
                    if let Some(breaker) = this.upgrade() {
                        breaker.on_reset_timeout();
                    }
                });
            }
        }
    }

    fn on_reset_timeout(&self) {
        let from = self.state();
        if let Some(to) = from.on(Trigger::ResetTimeoutElapsed, &self.policy()) {
            self.transition(from, to);
        }
    }

    #[cfg(test)]
    pub(crate) fn timer_armed_count(&self) -> u64 {
        self.reset_timer.armed_count()
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("policy", &self.policy())
            .finish()
    }
}

/// Serializable view of a breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub policy: Policy,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
}
