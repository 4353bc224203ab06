//! Dispatch surface: the boundary between the routing core and the
//! transport that actually forwards bytes.
//!
//! # Data Flow
//! ```text
//! Inbound request → ProxyCore.select_target(client_key)
//!     → TargetId, or NoHealthyTarget (caller responds 503)
//!     → external Dispatcher.forward(target_url, request)
//!         success → response returned upstream
//!         failure → registry counts one failure immediately
//!                 → out-of-band probe kicked (fast detection)
//!                 → caller responds 502, no retry on another target
//! ```
//!
//! # Design Decisions
//! - Tunneling, TLS termination and header rewriting live behind the
//!   `Dispatcher` trait; this core never touches request bytes
//! - A dispatch failure affects only health bookkeeping for the target;
//!   the current request is never transparently retried

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

use crate::balancer::affinity::{spawn_reset_task, SessionAffinityTable};
use crate::balancer::engine::RoutingDecisionEngine;
use crate::balancer::registry::TargetRegistry;
use crate::balancer::target::{TargetId, TargetSnapshot};
use crate::config::RoutingConfig;
use crate::error::{CoreError, GatewayError, NoHealthyTarget};
use crate::health::prober::HealthProber;
use crate::lifecycle::shutdown::{DrainOutcome, ShutdownCoordinator, ShutdownState};
use crate::observability::metrics;

/// Reported by the transport when forwarding fails.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct DispatchFailure {
    pub reason: String,
}

impl DispatchFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The external forwarding primitive.
pub trait Dispatcher {
    type Request;
    type Response;

    fn forward(
        &self,
        target: &Url,
        request: Self::Request,
    ) -> impl Future<Output = Result<Self::Response, DispatchFailure>> + Send;
}

/// Facade wiring registry, affinity table, decision engine, prober and
/// shutdown coordinator together. One instance per proxy process.
#[derive(Debug)]
pub struct ProxyCore {
    registry: Arc<TargetRegistry>,
    affinity: Arc<SessionAffinityTable>,
    engine: RoutingDecisionEngine,
    prober: Arc<HealthProber>,
    shutdown: Arc<ShutdownCoordinator>,
    affinity_reset_interval: Option<Duration>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
}

impl ProxyCore {
    /// Build the core from a validated configuration.
    pub fn new(config: RoutingConfig) -> Result<Self, CoreError> {
        let urls = config
            .targets
            .iter()
            .map(|t| {
                Url::parse(&t.url).map_err(|source| CoreError::InvalidTargetUrl {
                    url: t.url.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let affinity = Arc::new(SessionAffinityTable::new(config.sticky_session.enabled));
        let registry = Arc::new(TargetRegistry::new(
            urls,
            &config.health_check,
            Arc::clone(&affinity),
        ));
        let engine = RoutingDecisionEngine::new(
            Arc::clone(&registry),
            Arc::clone(&affinity),
            config.failover.enabled,
        );
        let prober = Arc::new(HealthProber::new(
            Arc::clone(&registry),
            config.health_check.clone(),
        )?);
        let shutdown = Arc::new(ShutdownCoordinator::new(Duration::from_millis(
            config.shutdown.grace_period_ms,
        )));

        let affinity_reset_interval = config
            .sticky_session
            .enabled
            .then(|| Duration::from_millis(config.sticky_session.reset_interval_ms));

        Ok(Self {
            registry,
            affinity,
            engine,
            prober,
            shutdown,
            affinity_reset_interval,
            reset_task: Mutex::new(None),
        })
    }

    /// Start background work: per-target probe loops and the affinity
    /// reset timer.
    pub fn start(&self) {
        self.prober.start();

        if let Some(interval) = self.affinity_reset_interval {
            let task = spawn_reset_task(
                Arc::clone(&self.affinity),
                interval,
                self.shutdown.subscribe(),
            );
            *self
                .reset_task
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(task);
        }
    }

    /// Pick a target for the given client key.
    pub fn select_target(&self, client_key: &str) -> Result<TargetId, NoHealthyTarget> {
        self.engine.select_target(client_key)
    }

    /// Base URL of a target, if the id is valid.
    pub fn target_url(&self, id: TargetId) -> Option<Url> {
        self.registry.url(id)
    }

    /// Bookkeeping for a forwarding error reported by the transport:
    /// one failure counted immediately plus an out-of-band probe.
    pub fn report_dispatch_failure(&self, id: TargetId) {
        self.registry.record_dispatch_failure(id);
        self.prober.probe_now(id);
    }

    /// Select a target and hand the request to the dispatcher, mapping
    /// the outcome for the embedding server.
    pub async fn route_and_forward<D: Dispatcher>(
        &self,
        client_key: &str,
        request: D::Request,
        dispatcher: &D,
    ) -> Result<D::Response, GatewayError> {
        let id = self.select_target(client_key)?;
        let url = self.target_url(id).ok_or(NoHealthyTarget)?;

        metrics::record_request(url.as_str());

        match dispatcher.forward(&url, request).await {
            Ok(response) => Ok(response),
            Err(failure) => {
                tracing::error!(target = %url, error = %failure, "dispatch failed");
                self.report_dispatch_failure(id);
                Err(GatewayError::BadGateway {
                    target: url.to_string(),
                    reason: failure.reason,
                })
            }
        }
    }

    /// Per-target health view for a diagnostics endpoint.
    pub fn status_snapshot(&self) -> Vec<TargetSnapshot> {
        self.registry.snapshot()
    }

    /// Handle a termination signal: transition to Draining and stop
    /// probing. Repeat calls are no-ops.
    pub fn begin_shutdown(&self) {
        if self.shutdown.begin() {
            self.prober.stop();
        }
    }

    /// Wait for the listener's drain future, bounded by the configured
    /// grace period.
    pub async fn drain(&self, connections_closed: impl Future<Output = ()>) -> DrainOutcome {
        self.shutdown.drain(connections_closed).await
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        self.shutdown.state()
    }

    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }
}
