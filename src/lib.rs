//! Decision core for a reverse-proxy load balancer.
//!
//! Given an inbound client identity and a pool of backend targets, this
//! crate decides which target should receive the request, while
//! continuously tracking target health and maintaining per-client
//! affinity. Byte-level forwarding, socket setup and CLI parsing belong
//! to the embedding server.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                 ROUTING CORE                  │
//!   client key    │  ┌──────────┐   ┌──────────┐   ┌───────────┐ │
//!   ──────────────┼─▶│ dispatch │──▶│ balancer │──▶│ affinity  │ │
//!                 │  │ surface  │   │  engine  │   │   table   │ │
//!                 │  └────┬─────┘   └────┬─────┘   └───────────┘ │
//!                 │       │              │                        │
//!                 │       ▼              ▼                        │
//!   forward via   │  ┌──────────┐   ┌──────────┐   ┌───────────┐ │
//!   Dispatcher ◀──┼──│ selected │   │  target  │◀──│  health   │ │
//!                 │  │  target  │   │ registry │   │  prober   │ │
//!                 │  └──────────┘   └──────────┘   └───────────┘ │
//!                 │                                               │
//!                 │  ┌─────────────────────────────────────────┐ │
//!                 │  │ cross-cutting: config, observability,    │ │
//!                 │  │ lifecycle (shutdown coordination)        │ │
//!                 │  └─────────────────────────────────────────┘ │
//!                 └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod balancer;
pub mod config;
pub mod dispatch;
pub mod health;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use balancer::affinity::SessionAffinityTable;
pub use balancer::engine::RoutingDecisionEngine;
pub use balancer::registry::TargetRegistry;
pub use balancer::target::{Target, TargetId, TargetSnapshot, TransitionEvent};
pub use config::RoutingConfig;
pub use dispatch::{DispatchFailure, Dispatcher, ProxyCore};
pub use error::{CoreError, GatewayError, NoHealthyTarget};
pub use health::probe::{HealthCheckResult, ProbeError};
pub use health::prober::HealthProber;
pub use lifecycle::shutdown::{DrainOutcome, ShutdownCoordinator, ShutdownState};
pub use lifecycle::signals::shutdown_on_signal;
