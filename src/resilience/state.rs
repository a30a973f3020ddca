//! Breaker state machine.
//!
//! # States
//! - Closed: primary is called; consecutive failures are counted
//! - Open: tripped; callers are redirected to the fallback
//! - HalfOpen: probation; consecutive successes are counted
//!
//! # State Transitions
//! ```text
//! Closed   → Open:     consecutive failures == max_errors
//! Open     → HalfOpen: circuit_reset_timeout elapsed since entry (autonomous)
//! HalfOpen → Closed:   consecutive successes == required_successes_to_close
//! HalfOpen → Open:     any failure
//! ```
//!
//! # Design Decisions
//! - The transition table is one pure function, `CircuitState::on`
//! - Counters live in the breaker; triggers carry the post-increment value
//! - Thresholds compare with `==`, so exactly one reporter observes the crossing

use serde::{Deserialize, Serialize};

use crate::resilience::policy::Policy;

/// Breaker state.
///
/// Stored as a `u8` inside the breaker so transitions are a single
/// compare-and-swap.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(val: u8) -> Self {
        match val {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// An event fed to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A failure was reported; `consecutive` is the counter after this report.
    Failure { consecutive: u32 },
    /// A success was reported; `consecutive` is the counter after this report.
    Success { consecutive: u32 },
    /// The Open dwell time elapsed.
    ResetTimeoutElapsed,
}

impl CircuitState {
    /// Whether the next call should go to the fallback.
    pub fn is_tripped(self) -> bool {
        matches!(self, CircuitState::Open)
    }

    /// Target state for `trigger`, or `None` to stay put.
    pub fn on(self, trigger: Trigger, policy: &Policy) -> Option<CircuitState> {
        match (self, trigger) {
            (CircuitState::Closed, Trigger::Failure { consecutive })
                if consecutive == policy.max_errors =>
            {
                Some(CircuitState::Open)
            }
            (CircuitState::HalfOpen, Trigger::Failure { .. }) => Some(CircuitState::Open),
            (CircuitState::HalfOpen, Trigger::Success { consecutive })
                if consecutive == policy.required_successes_to_close =>
            {
                Some(CircuitState::Closed)
            }
            (CircuitState::Open, Trigger::ResetTimeoutElapsed) => Some(CircuitState::HalfOpen),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Policy {
        Policy::default().with_max_errors(3).with_required_successes_to_close(2)
    }

    #[test]
    fn test_closed_trips_only_at_threshold() {
        let p = policy();
        assert_eq!(CircuitState::Closed.on(Trigger::Failure { consecutive: 1 }, &p), None);
        assert_eq!(CircuitState::Closed.on(Trigger::Failure { consecutive: 2 }, &p), None);
        assert_eq!(
            CircuitState::Closed.on(Trigger::Failure { consecutive: 3 }, &p),
            Some(CircuitState::Open)
        );
        // Only the reporter that hits the threshold exactly fires the transition.
        assert_eq!(CircuitState::Closed.on(Trigger::Failure { consecutive: 4 }, &p), None);
    }

    #[test]
    fn test_open_ignores_outcomes() {
        let p = policy();
        assert_eq!(CircuitState::Open.on(Trigger::Failure { consecutive: 3 }, &p), None);
        assert_eq!(CircuitState::Open.on(Trigger::Success { consecutive: 2 }, &p), None);
        assert_eq!(
            CircuitState::Open.on(Trigger::ResetTimeoutElapsed, &p),
            Some(CircuitState::HalfOpen)
        );
    }

    #[test]
    fn test_half_open_transitions() {
        let p = policy();
        assert_eq!(
            CircuitState::HalfOpen.on(Trigger::Failure { consecutive: 1 }, &p),
            Some(CircuitState::Open)
        );
        assert_eq!(CircuitState::HalfOpen.on(Trigger::Success { consecutive: 1 }, &p), None);
        assert_eq!(
            CircuitState::HalfOpen.on(Trigger::Success { consecutive: 2 }, &p),
            Some(CircuitState::Closed)
        );
    }

    #[test]
    fn test_reset_timeout_only_applies_to_open() {
        let p = policy();
        assert_eq!(CircuitState::Closed.on(Trigger::ResetTimeoutElapsed, &p), None);
        assert_eq!(CircuitState::HalfOpen.on(Trigger::ResetTimeoutElapsed, &p), None);
    }

    #[test]
    fn test_zero_max_errors_never_trips() {
        let p = Policy::default().with_max_errors(0);
        for consecutive in 1..10 {
            assert_eq!(CircuitState::Closed.on(Trigger::Failure { consecutive }, &p), None);
        }
    }

    #[test]
    fn test_only_open_is_tripped() {
        assert!(!CircuitState::Closed.is_tripped());
        assert!(CircuitState::Open.is_tripped());
        assert!(!CircuitState::HalfOpen.is_tripped());
    }

    #[test]
    fn test_u8_roundtrip_and_display() {
        for state in [CircuitState::Closed, CircuitState::Open, CircuitState::HalfOpen] {
            assert_eq!(CircuitState::from(state as u8), state);
        }
        assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
    }
}
