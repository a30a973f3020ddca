//! Circuit breaker recovery for asynchronous sources.
//!
//! Pairs a primary source with a fallback under a named, shared circuit
//! breaker. Failed or timed-out primary attempts are retried until the
//! breaker trips; after that the fallback is used, and the breaker heals
//! itself through a half-open probation once its reset timeout elapses.
//!
//! # Example
//!
//! ```no_run
//! use circuit_recovery::{BreakerRegistry, Source, SourceExt};
//! use futures_util::{stream, StreamExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = BreakerRegistry::default();
//!
//! let primary = || stream::iter(vec![Ok::<_, std::io::Error>("fresh")]);
//! let fallback = || stream::iter(vec![Ok::<_, std::io::Error>("cached")]);
//!
//! let source = primary.recover_with(fallback, &registry, "inventory")?;
//! let items: Vec<Result<&str, std::io::Error>> = source.subscribe().collect().await;
//! assert_eq!(items.len(), 1);
//! # Ok(())
//! # }
//! ```

// Core
pub mod resilience;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::RecoveryConfig;
pub use resilience::{
    recover, BreakerError, BreakerRegistry, CircuitBreaker, CircuitState, Policy, Recover,
    Source, SourceExt, SourceStream, DEFAULT_BREAKER_NAME,
};
