//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RoutingConfig (validated, immutable)
//!     → shared with the core at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::FailoverConfig;
pub use schema::HealthCheckConfig;
pub use schema::RoutingConfig;
pub use schema::ShutdownConfig;
pub use schema::StickySessionConfig;
pub use schema::TargetConfig;
