//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Caller subscribes to a Recover source:
//!     → registry.rs (look up the named breaker)
//!     → recovery.rs (driver task per subscription)
//!     → timeouts.rs (one primary attempt, bounded by invocation timeout)
//!     → circuit_breaker.rs (report outcome, then read trip status)
//!         → state.rs (pure transition table)
//!         → timer.rs (Open → HalfOpen after the reset timeout)
//!     → retry the primary, or relay the fallback once
//! ```
//!
//! # Design Decisions
//! - One breaker per name, shared by every caller using that name
//! - Lock-free reporting: atomic counters plus compare-and-swap transitions
//! - Timeouts are failures; the breaker does not tell them apart
//! - Single fallback, fixed thresholds; no backoff between retries

pub mod circuit_breaker;
pub mod policy;
pub mod recovery;
pub mod registry;
pub mod source;
pub mod state;
pub mod types;

mod timeouts;
mod timer;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, NextSource};
pub use policy::Policy;
pub use recovery::{recover, Recover, SourceExt};
pub use registry::{BreakerRegistry, DEFAULT_BREAKER_NAME};
pub use source::{Source, SourceStream};
pub use state::CircuitState;
pub use types::{AttemptError, BreakerError, BreakerResult};
