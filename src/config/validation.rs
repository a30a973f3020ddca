//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject breaker entries the registry could never hold
//! - Flag policies that will never trip or never heal
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Zero thresholds are warnings, not errors: policies are taken as written
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{PolicyConfig, RecoveryConfig};

/// A configuration rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `breakers[index]` has an empty name.
    #[error("breakers[{0}]: name must not be empty")]
    EmptyBreakerName(usize),

    /// The same breaker name appears more than once.
    #[error("breaker '{0}' is configured more than once")]
    DuplicateBreaker(String),
}

/// Check `config`, collecting every error.
pub fn validate_config(config: &RecoveryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    warn_degenerate("default_policy", &config.default_policy);

    for (index, breaker) in config.breakers.iter().enumerate() {
        if breaker.name.is_empty() {
            errors.push(ValidationError::EmptyBreakerName(index));
            continue;
        }
        if !seen.insert(breaker.name.as_str()) {
            errors.push(ValidationError::DuplicateBreaker(breaker.name.clone()));
        }
        warn_degenerate(&breaker.name, &breaker.policy);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn warn_degenerate(scope: &str, policy: &PolicyConfig) {
    if policy.max_errors == 0 {
        tracing::warn!(scope, "max_errors is 0; this breaker will never trip");
    }
    if policy.required_successes_to_close == 0 {
        tracing::warn!(scope, "required_successes_to_close is 0; this breaker will never close from half-open");
    }
    if policy.invocation_timeout_ms == 0 {
        tracing::warn!(scope, "invocation_timeout_ms is 0; every primary attempt will time out");
    }
}
