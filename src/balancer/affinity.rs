//! Sticky-session (client affinity) table.
//!
//! # Responsibilities
//! - Map client keys to previously chosen targets
//! - Evict entries whose target is no longer healthy
//! - Clear the whole table on a fixed interval
//!
//! # Design Decisions
//! - No per-entry expiry; the periodic full reset bounds staleness
//! - Eviction is both eager (on unhealthy transition, via the registry)
//!   and lazy (on a stale lookup)
//! - A single mutex makes clear_all atomic relative to lookups

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::balancer::registry::TargetRegistry;
use crate::balancer::target::TargetId;

/// Client-to-target affinity cache.
///
/// When the feature flag is off, `lookup` always returns `None` and
/// `record` is a no-op.
#[derive(Debug)]
pub struct SessionAffinityTable {
    enabled: bool,
    entries: Mutex<HashMap<String, TargetId>>,
}

impl SessionAffinityTable {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached target for a client only if the registry still
    /// reports it healthy; otherwise evict the entry.
    pub fn lookup(&self, client_key: &str, registry: &TargetRegistry) -> Option<TargetId> {
        if !self.enabled {
            return None;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let id = *entries.get(client_key)?;
        if registry.is_healthy(id) {
            Some(id)
        } else {
            entries.remove(client_key);
            tracing::debug!(client = %client_key, target = %id, "evicted stale affinity entry");
            None
        }
    }

    /// Cache a selection, overwriting any existing entry.
    pub fn record(&self, client_key: &str, target: TargetId) {
        if !self.enabled {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(client_key.to_string(), target);
    }

    /// Drop every entry. Atomic from the perspective of concurrent lookups.
    pub fn clear_all(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let cleared = entries.len();
        entries.clear();
        if cleared > 0 {
            tracing::debug!(cleared, "affinity table reset");
        }
    }

    /// Remove every entry pointing at the given target. Called by the
    /// registry when a target transitions to unhealthy.
    pub fn purge_target(&self, target: TargetId) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, cached| *cached != target);
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(target = %target, purged, "purged affinity entries for unhealthy target");
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Spawn the periodic full-reset task for the affinity table.
///
/// Runs until the shutdown signal fires.
pub fn spawn_reset_task(
    table: std::sync::Arc<SessionAffinityTable>,
    reset_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reset_interval);
        // The first tick completes immediately; skip it so the first
        // reset happens one full interval after startup.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    table.clear_all();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("affinity reset task exiting");
                    break;
                }
            }
        }
    })
}
