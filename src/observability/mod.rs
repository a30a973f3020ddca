//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resilience/ and config/ produce:
//!     → tracing events (breaker, from, to, attempt fields)
//!     → logging.rs (subscriber: env filter + fmt/json layer)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Structured fields over formatted strings so logs stay filterable
//! - No metrics exporter; `BreakerRegistry::snapshot` covers state inspection

pub mod logging;

pub use logging::init_logging;
