//! Target registry: owns per-target health state.
//!
//! # Responsibilities
//! - Hold one record per configured target, in configuration order
//! - Apply probe results and dispatch failures to the state machine
//! - Emit transition events only on actual health flips
//! - Eagerly purge affinity entries when a target turns unhealthy
//!
//! # Design Decisions
//! - All mutation goes through `apply_result`/`record_dispatch_failure`;
//!   nothing outside this module touches counters directly
//! - A single RwLock keeps every update atomic relative to routing
//!   decisions; the lock is never held across an await point

use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use url::Url;

use crate::balancer::affinity::SessionAffinityTable;
use crate::balancer::target::{Target, TargetId, TargetSnapshot, TransitionEvent};
use crate::config::HealthCheckConfig;
use crate::health::probe::HealthCheckResult;
use crate::observability::metrics;

/// Registry of all configured targets and their health state.
#[derive(Debug)]
pub struct TargetRegistry {
    targets: RwLock<Vec<Target>>,
    affinity: Arc<SessionAffinityTable>,
    unhealthy_threshold: u32,
    healthy_threshold: u32,
}

impl TargetRegistry {
    pub fn new(
        urls: Vec<Url>,
        health_config: &HealthCheckConfig,
        affinity: Arc<SessionAffinityTable>,
    ) -> Self {
        let targets = urls.into_iter().map(Target::new).collect();
        Self {
            targets: RwLock::new(targets),
            affinity,
            unhealthy_threshold: health_config.unhealthy_threshold,
            healthy_threshold: health_config.healthy_threshold,
        }
    }

    /// Number of configured targets.
    pub fn len(&self) -> usize {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Base URL of a target, if the id is valid.
    pub fn url(&self, id: TargetId) -> Option<Url> {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.0)
            .map(|t| t.url.clone())
    }

    /// Whether a target is currently healthy. Unknown ids are unhealthy.
    pub fn is_healthy(&self, id: TargetId) -> bool {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.0)
            .map(|t| t.healthy)
            .unwrap_or(false)
    }

    /// Apply a probe result. Returns an event only on an actual health
    /// flip. On a Healthy → Unhealthy flip, affinity entries for the
    /// target are purged before this returns.
    pub fn apply_result(
        &self,
        id: TargetId,
        result: &HealthCheckResult,
    ) -> Option<TransitionEvent> {
        let event = {
            let mut targets = self.targets.write().unwrap_or_else(PoisonError::into_inner);
            let target = targets.get_mut(id.0)?;

            target.last_checked_at = Some(SystemTime::now());
            if result.latency_ms.is_some() {
                target.last_latency_ms = result.latency_ms;
            }

            if result.succeeded {
                target
                    .note_success(self.healthy_threshold)
                    .then_some(TransitionEvent::BecameHealthy(id))
            } else {
                target
                    .note_failure(self.unhealthy_threshold)
                    .then_some(TransitionEvent::BecameUnhealthy(id))
            }
        };

        if let Some(event) = event {
            self.on_transition(event);
        }
        event
    }

    /// Fast failure path: the dispatcher reported a forwarding error.
    /// Counts one failure immediately instead of waiting for the next
    /// scheduled probe. The caller is expected to also kick an
    /// out-of-band probe (see `HealthProber::probe_now`).
    pub fn record_dispatch_failure(&self, id: TargetId) -> Option<TransitionEvent> {
        let event = {
            let mut targets = self.targets.write().unwrap_or_else(PoisonError::into_inner);
            let target = targets.get_mut(id.0)?;
            target
                .note_failure(self.unhealthy_threshold)
                .then_some(TransitionEvent::BecameUnhealthy(id))
        };

        if let Some(event) = event {
            self.on_transition(event);
        }
        event
    }

    fn on_transition(&self, event: TransitionEvent) {
        match event {
            TransitionEvent::BecameHealthy(id) => {
                let url = self.url(id).map(|u| u.to_string()).unwrap_or_default();
                tracing::info!(target = %id, url = %url, "target became healthy");
                metrics::record_target_health(&url, true);
            }
            TransitionEvent::BecameUnhealthy(id) => {
                let url = self.url(id).map(|u| u.to_string()).unwrap_or_default();
                tracing::warn!(target = %id, url = %url, "target became unhealthy");
                metrics::record_target_health(&url, false);
                self.affinity.purge_target(id);
            }
        }
    }

    /// Read-only view of every target, in configuration order.
    pub fn snapshot(&self) -> Vec<TargetSnapshot> {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(TargetSnapshot::from_target)
            .collect()
    }

    /// Ids of currently healthy targets, in configuration order.
    pub fn healthy_targets(&self) -> Vec<TargetId> {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .enumerate()
            .filter(|(_, t)| t.healthy)
            .map(|(i, _)| TargetId(i))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn mark_unhealthy_for_test(&self, id: TargetId) {
        let mut targets = self.targets.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(target) = targets.get_mut(id.0) {
            target.healthy = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::ProbeError;

    fn registry(unhealthy: u32, healthy: u32) -> (TargetRegistry, Arc<SessionAffinityTable>) {
        let affinity = Arc::new(SessionAffinityTable::new(true));
        let config = HealthCheckConfig {
            unhealthy_threshold: unhealthy,
            healthy_threshold: healthy,
            ..Default::default()
        };
        let urls = vec![
            Url::parse("http://127.0.0.1:3000").unwrap(),
            Url::parse("http://127.0.0.1:3001").unwrap(),
        ];
        (TargetRegistry::new(urls, &config, affinity.clone()), affinity)
    }

    fn ok() -> HealthCheckResult {
        HealthCheckResult::success(200, 5)
    }

    fn fail() -> HealthCheckResult {
        HealthCheckResult::failure(ProbeError::Connection("refused".into()), None)
    }

    #[test]
    fn test_transition_emitted_exactly_once() {
        let (registry, _) = registry(2, 1);
        let a = TargetId(0);

        assert_eq!(registry.apply_result(a, &fail()), None);
        assert_eq!(
            registry.apply_result(a, &fail()),
            Some(TransitionEvent::BecameUnhealthy(a))
        );
        assert_eq!(registry.apply_result(a, &fail()), None);

        assert_eq!(
            registry.apply_result(a, &ok()),
            Some(TransitionEvent::BecameHealthy(a))
        );
        let snapshot = &registry.snapshot()[0];
        assert!(snapshot.healthy);
        assert_eq!(snapshot.consecutive_failures, 0);
    }

    #[test]
    fn test_unhealthy_transition_purges_affinity() {
        let (registry, affinity) = registry(1, 1);
        let a = TargetId(0);
        let b = TargetId(1);
        affinity.record("ip1", a);
        affinity.record("ip2", b);

        registry.apply_result(a, &fail());

        assert_eq!(affinity.lookup("ip1", &registry), None);
        assert_eq!(affinity.lookup("ip2", &registry), Some(b));
    }

    #[test]
    fn test_dispatch_failure_counts_toward_threshold() {
        let (registry, _) = registry(2, 1);
        let a = TargetId(0);

        assert_eq!(registry.record_dispatch_failure(a), None);
        assert_eq!(
            registry.record_dispatch_failure(a),
            Some(TransitionEvent::BecameUnhealthy(a))
        );
        assert!(!registry.is_healthy(a));
    }

    #[test]
    fn test_healthy_targets_in_config_order() {
        let (registry, _) = registry(1, 1);
        registry.apply_result(TargetId(0), &fail());
        assert_eq!(registry.healthy_targets(), vec![TargetId(1)]);

        registry.apply_result(TargetId(0), &ok());
        assert_eq!(registry.healthy_targets(), vec![TargetId(0), TargetId(1)]);
    }

    #[test]
    fn test_snapshot_records_latency_and_timestamp() {
        let (registry, _) = registry(3, 2);
        registry.apply_result(TargetId(0), &ok());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].last_latency_ms, Some(5));
        assert!(snapshot[0].last_checked_ms.is_some());
        assert!(snapshot[1].last_checked_ms.is_none());
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let (registry, _) = registry(1, 1);
        assert_eq!(registry.apply_result(TargetId(9), &fail()), None);
        assert!(!registry.is_healthy(TargetId(9)));
    }
}
