//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active probes (prober.rs):
//!     Per-target timer
//!     → HTTP probe against the configured path
//!     → probe.rs (classify: success / timeout / connection / bad status)
//!     → registry (apply_result, transition events)
//!
//! Dispatch-failure fast path:
//!     Transport reports a forwarding error
//!     → registry counts one failure immediately
//!     → prober.probe_now kicks an out-of-band probe
//! ```
//!
//! # Design Decisions
//! - Probe errors are handled locally; they update counters and never
//!   propagate to a caller
//! - Timeouts are classified identically to connection errors for the
//!   state machine, but tagged distinctly for observability

pub mod probe;
pub mod prober;
