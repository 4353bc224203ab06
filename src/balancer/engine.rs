//! Routing decision engine.
//!
//! # Selection precedence
//! ```text
//! 1. Affinity hit (if enabled)      — sticky cache wins outright
//! 2. Failover (if enabled, >= 2 targets)
//!       primary healthy             → primary
//!       primary down, secondary up  → secondary
//! 3. Round-robin over healthy targets
//! 4. Nothing healthy               → NoHealthyTarget
//! ```
//!
//! Sticky cache wins over failover preference, and failover preference
//! wins over round-robin fairness: session stability and
//! primary-preference are favored over even load distribution.
//!
//! # Design Decisions
//! - The round-robin cursor advances over the fixed configured target
//!   list and skips unhealthy entries, so a health flip between calls
//!   never remaps the cursor to a different logical slot
//! - The cursor only advances when round-robin actually runs; affinity
//!   hits and failover picks leave it untouched

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::balancer::affinity::SessionAffinityTable;
use crate::balancer::registry::TargetRegistry;
use crate::balancer::target::TargetId;
use crate::error::NoHealthyTarget;
use crate::observability::metrics;

/// Selects a target for each inbound client.
#[derive(Debug)]
pub struct RoutingDecisionEngine {
    registry: Arc<TargetRegistry>,
    affinity: Arc<SessionAffinityTable>,
    failover_enabled: bool,
    cursor: AtomicUsize,
}

impl RoutingDecisionEngine {
    pub fn new(
        registry: Arc<TargetRegistry>,
        affinity: Arc<SessionAffinityTable>,
        failover_enabled: bool,
    ) -> Self {
        Self {
            registry,
            affinity,
            failover_enabled,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Pick a target for the given client key.
    pub fn select_target(&self, client_key: &str) -> Result<TargetId, NoHealthyTarget> {
        if let Some(id) = self.affinity.lookup(client_key, &self.registry) {
            tracing::debug!(client = %client_key, target = %id, "affinity hit");
            return Ok(id);
        }

        let selected = self.failover_pick().or_else(|| self.round_robin_pick());

        match selected {
            Some(id) => {
                self.affinity.record(client_key, id);
                tracing::debug!(client = %client_key, target = %id, "target selected");
                Ok(id)
            }
            None => {
                tracing::warn!(client = %client_key, "no healthy target available");
                metrics::record_no_healthy_target();
                Err(NoHealthyTarget)
            }
        }
    }

    /// Primary/secondary preference. `None` means fall through to
    /// round-robin (covers: disabled, fewer than two targets, or both
    /// primary and secondary down).
    fn failover_pick(&self) -> Option<TargetId> {
        if !self.failover_enabled || self.registry.len() < 2 {
            return None;
        }
        let primary = TargetId(0);
        let secondary = TargetId(1);

        if self.registry.is_healthy(primary) {
            Some(primary)
        } else if self.registry.is_healthy(secondary) {
            tracing::debug!("primary down, failing over to secondary");
            Some(secondary)
        } else {
            None
        }
    }

    /// Rotate over the configured target list, skipping unhealthy
    /// entries.
    fn round_robin_pick(&self) -> Option<TargetId> {
        let len = self.registry.len();
        if len == 0 {
            return None;
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        for i in 0..len {
            let id = TargetId((start + i) % len);
            if self.registry.is_healthy(id) {
                if i > 0 {
                    // Consume the skipped slots so the next call starts
                    // past the selected target instead of repeating it.
                    self.cursor.store(start + i + 1, Ordering::Relaxed);
                }
                return Some(id);
            }
        }
        None
    }
}
