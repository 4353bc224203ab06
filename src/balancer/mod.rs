//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request → engine.rs (select_target)
//!     → affinity.rs (sticky cache, checked first)
//!     → registry.rs (health state, config order)
//!     → failover preference or round-robin rotation
//!     → TargetId returned to the dispatch surface
//!
//! Probe results → registry.rs (apply_result)
//!     → transition events on health flips
//!     → eager affinity purge on Healthy → Unhealthy
//! ```
//!
//! # Design Decisions
//! - Registry and affinity table are explicitly owned, Arc-shared
//!   objects; no ambient globals
//! - Unhealthy targets are excluded from every selection path
//! - Selection precedence: affinity > failover > round-robin

pub mod affinity;
pub mod engine;
pub mod registry;
pub mod target;
