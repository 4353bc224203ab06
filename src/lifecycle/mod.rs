//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Termination signal → ShutdownCoordinator.begin()
//!     → broadcast to probe loops and the affinity reset task
//!     → HealthProber.stop() (in-flight probes abandoned)
//!     → drain(): wait for listener, bounded by grace period
//!     → Terminated (graceful or forced)
//! ```
//!
//! # Design Decisions
//! - Shutdown has a deadline: forced exit when the grace timer fires
//! - Repeat termination signals while draining are no-ops

pub mod shutdown;
pub mod signals;

pub use shutdown::{DrainOutcome, ShutdownCoordinator, ShutdownState};
pub use signals::{begin_on, shutdown_on_signal, wait_for_signal};
