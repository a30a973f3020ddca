//! Breaker policy values.
//!
//! # Responsibilities
//! - Hold the thresholds and timeouts a breaker trips and heals by
//! - Provide the stock defaults new registries start from
//!
//! # Design Decisions
//! - No validation: a zero threshold is accepted as-is (a zero `max_errors`
//!   never trips, a zero `required_successes_to_close` never heals)
//! - `Policy` is `Copy`; breakers hand out snapshots, never references

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Thresholds and timeouts governing a single breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Consecutive failures that trip Closed → Open.
    pub max_errors: u32,

    /// Consecutive successes that heal HalfOpen → Closed.
    pub required_successes_to_close: u32,

    /// Dwell time in Open before the breaker probes again (HalfOpen).
    #[serde(with = "duration_millis")]
    pub circuit_reset_timeout: Duration,

    /// Deadline for one attempt against the primary source.
    #[serde(with = "duration_millis")]
    pub invocation_timeout: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_errors: 3,
            required_successes_to_close: 1,
            circuit_reset_timeout: Duration::from_secs(10),
            invocation_timeout: Duration::from_secs(2),
        }
    }
}

impl Policy {
    /// Set the number of consecutive failures that trips the breaker.
    pub fn with_max_errors(mut self, max_errors: u32) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Set the number of consecutive half-open successes that closes the breaker.
    pub fn with_required_successes_to_close(mut self, successes: u32) -> Self {
        self.required_successes_to_close = successes;
        self
    }

    /// Set how long the breaker stays open before probing.
    pub fn with_circuit_reset_timeout(mut self, timeout: Duration) -> Self {
        self.circuit_reset_timeout = timeout;
        self
    }

    /// Set the per-attempt deadline for the primary source.
    pub fn with_invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = timeout;
        self
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn as_millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    use super::as_millis_u64;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        as_millis_u64(*duration).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = Policy::default();
        assert_eq!(policy.max_errors, 3);
        assert_eq!(policy.required_successes_to_close, 1);
        assert_eq!(policy.circuit_reset_timeout, Duration::from_secs(10));
        assert_eq!(policy.invocation_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_policy_builder() {
        let policy = Policy::default()
            .with_max_errors(5)
            .with_required_successes_to_close(2)
            .with_circuit_reset_timeout(Duration::from_millis(100))
            .with_invocation_timeout(Duration::from_millis(250));

        assert_eq!(policy.max_errors, 5);
        assert_eq!(policy.required_successes_to_close, 2);
        assert_eq!(policy.circuit_reset_timeout, Duration::from_millis(100));
        assert_eq!(policy.invocation_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_thresholds_are_accepted() {
        let policy = Policy::default().with_max_errors(0).with_required_successes_to_close(0);
        assert_eq!(policy.max_errors, 0);
        assert_eq!(policy.required_successes_to_close, 0);
    }

    #[test]
    fn test_json_uses_millis() {
        let policy = Policy::default().with_invocation_timeout(Duration::from_millis(1500));
        let json = serde_json::to_value(policy).unwrap();
        assert_eq!(json["invocation_timeout"], 1500);
        assert_eq!(json["circuit_reset_timeout"], 10_000);
    }

    #[test]
    fn test_millis_saturate_instead_of_wrapping() {
        assert_eq!(as_millis_u64(Duration::MAX), u64::MAX);
        assert_eq!(as_millis_u64(Duration::from_millis(u64::MAX)), u64::MAX);
        assert_eq!(as_millis_u64(Duration::from_micros(1_999)), 1);
    }

    #[test]
    fn test_json_round_trip_at_the_limit() {
        let policy = Policy::default().with_circuit_reset_timeout(Duration::from_millis(u64::MAX));
        let json = serde_json::to_string(&policy).unwrap();
        let back: Policy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);

        let huge = Policy::default().with_invocation_timeout(Duration::MAX);
        let json = serde_json::to_value(huge).unwrap();
        assert_eq!(json["invocation_timeout"], u64::MAX);
    }
}
