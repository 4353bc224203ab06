//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Whatever metrics exporter the embedding server installs
//! ```
//!
//! # Design Decisions
//! - Health transitions and probe failures are always logged with the
//!   failure kind
//! - Metric updates are cheap; no exporter is wired in here

pub mod logging;
pub mod metrics;
