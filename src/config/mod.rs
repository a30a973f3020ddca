//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RecoveryConfig
//!     → BreakerRegistry::apply_config (default policy, named policies)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → apply_updates hands it to the registry
//!     → live breakers see the new policy on their next read
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - A rejected reload keeps the current policies
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::BreakerConfig;
pub use schema::LoggingConfig;
pub use schema::PolicyConfig;
pub use schema::RecoveryConfig;
