//! Target abstraction.
//!
//! # Responsibilities
//! - Represent a single backend target
//! - Track health state and probe counters
//! - Apply the hysteresis transition rules
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: consecutive failures >= unhealthy_threshold
//! Unhealthy → Healthy: consecutive successes >= healthy_threshold
//! ```
//!
//! Thresholds compare with `>=`, so a threshold of 1 flips on the first
//! counted event. A success zeroes the failure counter and vice versa.

use std::time::SystemTime;

use serde::Serialize;
use url::Url;

/// Index of a target in configuration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TargetId(pub usize);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Emitted when a target actually changes health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    BecameHealthy(TargetId),
    BecameUnhealthy(TargetId),
}

/// A single backend target and its health bookkeeping.
///
/// One record per configured backend, created at startup, never
/// destroyed. Targets start healthy; the first probe round corrects the
/// state if the backend is actually down.
#[derive(Debug, Clone)]
pub struct Target {
    /// Backend base URL.
    pub url: Url,
    /// Current health flag.
    pub healthy: bool,
    /// Consecutive failed probes since the last success.
    pub consecutive_failures: u32,
    /// Consecutive successful probes since the last failure.
    pub consecutive_successes: u32,
    /// Latency of the most recent completed probe, if any.
    pub last_latency_ms: Option<u64>,
    /// When the target was last probed, if ever.
    pub last_checked_at: Option<SystemTime>,
}

impl Target {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            healthy: true,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_latency_ms: None,
            last_checked_at: None,
        }
    }

    /// Record a successful probe. Returns true on an Unhealthy → Healthy flip.
    pub fn note_success(&mut self, healthy_threshold: u32) -> bool {
        self.consecutive_failures = 0;
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);

        if !self.healthy && self.consecutive_successes >= healthy_threshold {
            self.healthy = true;
            return true;
        }
        false
    }

    /// Record a failed probe or dispatch failure. Returns true on a
    /// Healthy → Unhealthy flip.
    pub fn note_failure(&mut self, unhealthy_threshold: u32) -> bool {
        self.consecutive_successes = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.healthy && self.consecutive_failures >= unhealthy_threshold {
            self.healthy = false;
            return true;
        }
        false
    }
}

/// Read-only view of a target for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSnapshot {
    pub url: String,
    pub healthy: bool,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub last_latency_ms: Option<u64>,
    /// Unix timestamp in milliseconds of the last probe, if any.
    pub last_checked_ms: Option<u64>,
}

impl TargetSnapshot {
    pub(crate) fn from_target(target: &Target) -> Self {
        let last_checked_ms = target.last_checked_at.and_then(|t| {
            t.duration_since(SystemTime::UNIX_EPOCH)
                .ok()
                .map(|d| d.as_millis() as u64)
        });
        Self {
            url: target.url.to_string(),
            healthy: target.healthy,
            consecutive_failures: target.consecutive_failures,
            consecutive_successes: target.consecutive_successes,
            last_latency_ms: target.last_latency_ms,
            last_checked_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target::new(Url::parse("http://127.0.0.1:3000").unwrap())
    }

    #[test]
    fn test_flips_unhealthy_at_threshold() {
        let mut t = target();
        assert!(!t.note_failure(3));
        assert!(!t.note_failure(3));
        assert!(t.note_failure(3));
        assert!(!t.healthy);
        // No duplicate transition on further failures.
        assert!(!t.note_failure(3));
    }

    #[test]
    fn test_flips_healthy_at_threshold() {
        let mut t = target();
        t.note_failure(1);
        assert!(!t.healthy);
        assert!(!t.note_success(2));
        assert!(t.note_success(2));
        assert!(t.healthy);
    }

    #[test]
    fn test_counters_are_mutually_exclusive() {
        let mut t = target();
        t.note_failure(10);
        t.note_failure(10);
        assert_eq!(t.consecutive_failures, 2);
        t.note_success(10);
        assert_eq!(t.consecutive_failures, 0);
        assert_eq!(t.consecutive_successes, 1);
        t.note_failure(10);
        assert_eq!(t.consecutive_successes, 0);
        assert_eq!(t.consecutive_failures, 1);
    }

    #[test]
    fn test_threshold_of_one_flips_immediately() {
        let mut t = target();
        assert!(t.note_failure(1));
        assert!(t.note_success(1));
        assert!(t.healthy);
        assert_eq!(t.consecutive_failures, 0);
    }
}
