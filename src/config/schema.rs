//! Configuration schema definitions.
//!
//! This module defines the configuration file structure for breaker policies.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::policy::{as_millis_u64, Policy};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Policy copied into every breaker at creation.
    pub default_policy: PolicyConfig,

    /// Per-breaker policy overrides.
    pub breakers: Vec<BreakerConfig>,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Breaker policy as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Consecutive failures that trip the breaker.
    pub max_errors: u32,

    /// Consecutive half-open successes that close the breaker.
    pub required_successes_to_close: u32,

    /// Open dwell time in milliseconds.
    pub circuit_reset_timeout_ms: u64,

    /// Per-attempt deadline in milliseconds.
    pub invocation_timeout_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Policy::default().into()
    }
}

impl From<PolicyConfig> for Policy {
    fn from(config: PolicyConfig) -> Self {
        Policy {
            max_errors: config.max_errors,
            required_successes_to_close: config.required_successes_to_close,
            circuit_reset_timeout: Duration::from_millis(config.circuit_reset_timeout_ms),
            invocation_timeout: Duration::from_millis(config.invocation_timeout_ms),
        }
    }
}

impl From<Policy> for PolicyConfig {
    fn from(policy: Policy) -> Self {
        PolicyConfig {
            max_errors: policy.max_errors,
            required_successes_to_close: policy.required_successes_to_close,
            circuit_reset_timeout_ms: as_millis_u64(policy.circuit_reset_timeout),
            invocation_timeout_ms: as_millis_u64(policy.invocation_timeout),
        }
    }
}

/// A named breaker and its policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakerConfig {
    /// Breaker name (registry key).
    pub name: String,

    /// Policy applied to this breaker; unset fields take the stock defaults.
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "circuit_recovery=info".to_string(),
            json: false,
        }
    }
}
