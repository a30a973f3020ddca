//! Named breaker registry.
//!
//! # Responsibilities
//! - Map breaker names to shared `CircuitBreaker` instances
//! - Hold the default policy new breakers copy at creation
//! - Apply policies loaded from configuration
//!
//! # Design Decisions
//! - Explicit object shared via `Arc`, not a global; callers that should
//!   share breakers share the registry
//! - Get-or-insert goes through the map's entry API, so at most one breaker
//!   is ever built per name even under racing callers
//! - `reset()` drops every breaker; intended for test isolation

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::schema::RecoveryConfig;
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker};
use crate::resilience::policy::Policy;
use crate::resilience::recovery::Recover;
use crate::resilience::source::Source;
use crate::resilience::types::{BreakerError, BreakerResult};

/// Name used when callers don't pick one.
pub const DEFAULT_BREAKER_NAME: &str = "global";

/// Process-wide set of named breakers.
#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_policy: ArcSwap<Policy>,
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

impl BreakerRegistry {
    /// Create an empty registry whose new breakers start from `default_policy`.
    pub fn new(default_policy: Policy) -> Self {
        Self {
            breakers: DashMap::new(),
            default_policy: ArcSwap::from_pointee(default_policy),
        }
    }

    /// Build a registry from loaded configuration.
    pub fn from_config(config: &RecoveryConfig) -> Self {
        let registry = Self::new(config.default_policy.into());
        registry.apply_config(config);
        registry
    }

    /// Get the breaker called `name`, creating it if needed.
    pub fn get_instance(&self, name: &str) -> BreakerResult<Arc<CircuitBreaker>> {
        if name.is_empty() {
            return Err(BreakerError::EmptyName);
        }

        if let Some(existing) = self.breakers.get(name) {
            return Ok(existing.value().clone());
        }

        let breaker = self
            .breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(breaker = %name, "Creating circuit breaker");
                CircuitBreaker::new(name, self.default_policy())
            })
            .value()
            .clone();
        Ok(breaker)
    }

    /// The breaker named [`DEFAULT_BREAKER_NAME`].
    pub fn get_default(&self) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(DEFAULT_BREAKER_NAME.to_string())
            .or_insert_with(|| CircuitBreaker::new(DEFAULT_BREAKER_NAME, self.default_policy()))
            .value()
            .clone()
    }

    /// Pair `primary` with `fallback` under this registry's breaker called `name`.
    pub fn recover<T, E, P, F>(&self, primary: P, fallback: F, name: &str) -> BreakerResult<Recover<P, F>>
    where
        P: Source<T, E>,
        F: Source<T, E>,
    {
        Recover::new(primary, fallback, self, name)
    }

    pub fn default_policy(&self) -> Policy {
        **self.default_policy.load()
    }

    /// Replace the default policy. Existing breakers keep their own values.
    pub fn set_default_policy(&self, policy: Policy) {
        self.default_policy.store(Arc::new(policy));
    }

    /// Apply a loaded configuration: default policy first, then named policies.
    pub fn apply_config(&self, config: &RecoveryConfig) {
        self.set_default_policy(config.default_policy.into());

        for breaker_config in &config.breakers {
            match self.get_instance(&breaker_config.name) {
                Ok(breaker) => breaker.apply_policy(breaker_config.policy.into()),
                Err(e) => tracing::warn!(error = %e, "Skipping breaker policy"),
            }
        }

        tracing::info!(
            breakers = config.breakers.len(),
            "Breaker configuration applied"
        );
    }

    /// Drop every breaker. Holders of old instances keep them, detached.
    pub fn reset(&self) {
        self.breakers.clear();
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Names of all registered breakers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Snapshot of every breaker, sorted by name.
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<BreakerSnapshot> =
            self.breakers.iter().map(|r| r.value().snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }
}
