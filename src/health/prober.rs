//! Active health probing.
//!
//! # Responsibilities
//! - Run one independent probe loop per target
//! - Classify probe outcomes and apply them to the registry
//! - Serve out-of-band probe requests (dispatch-failure fast path)
//!
//! # Design Decisions
//! - Independent per-target timers: a slow or unreachable target never
//!   delays probes to healthy ones
//! - Probes for the same target are strictly sequential (one task, one
//!   in-flight request)
//! - A probe in flight when `stop` is called is abandoned, never
//!   applied to the registry

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use reqwest::Method;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use url::Url;

use crate::balancer::registry::TargetRegistry;
use crate::balancer::target::TargetId;
use crate::config::HealthCheckConfig;
use crate::error::CoreError;
use crate::health::probe::{HealthCheckResult, ProbeError};
use crate::observability::metrics;

/// Schedules and executes periodic health probes, one task per target.
pub struct HealthProber {
    registry: Arc<TargetRegistry>,
    config: HealthCheckConfig,
    client: reqwest::Client,
    kicks: Vec<Arc<Notify>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    stop_tx: broadcast::Sender<()>,
    stopped: AtomicBool,
}

impl HealthProber {
    pub fn new(registry: Arc<TargetRegistry>, config: HealthCheckConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()?;

        let kicks = (0..registry.len()).map(|_| Arc::new(Notify::new())).collect();
        let (stop_tx, _) = broadcast::channel(1);

        Ok(Self {
            registry,
            config,
            client,
            kicks,
            tasks: Mutex::new(Vec::new()),
            stop_tx,
            stopped: AtomicBool::new(false),
        })
    }

    /// Start probing. No-op when probing is disabled. Each target gets
    /// one immediate probe, then recurring probes at the configured
    /// interval.
    pub fn start(self: &Arc<Self>) {
        if !self.config.enabled {
            tracing::info!("active health probes disabled");
            return;
        }

        tracing::info!(
            interval_ms = self.config.interval_ms,
            path = %self.config.path,
            targets = self.registry.len(),
            "health prober starting"
        );

        let interval = Duration::from_millis(self.config.interval_ms);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for index in 0..self.registry.len() {
            let prober = Arc::clone(self);
            let id = TargetId(index);
            let kick = Arc::clone(&self.kicks[index]);
            let stop = self.stop_tx.subscribe();
            tasks.push(tokio::spawn(async move {
                prober.run_target(id, kick, stop, interval).await;
            }));
        }
    }

    /// Request an immediate out-of-band probe of one target. Coalesces
    /// with the target's regular probe loop.
    pub fn probe_now(&self, id: TargetId) {
        if !self.config.enabled || self.stopped.load(Ordering::Relaxed) {
            return;
        }
        if let Some(kick) = self.kicks.get(id.0) {
            tracing::debug!(target = %id, "out-of-band probe requested");
            kick.notify_one();
        }
    }

    /// Stop all probe loops and abandon in-flight probes. Idempotent.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.stop_tx.send(());
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
        tracing::info!("health prober stopped");
    }

    async fn run_target(
        &self,
        id: TargetId,
        kick: Arc<Notify>,
        mut stop: broadcast::Receiver<()>,
        interval: Duration,
    ) {
        let Some(url) = self.registry.url(id) else {
            return;
        };

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = kick.notified() => {}
                _ = stop.recv() => break,
            }

            // Race the probe against shutdown so a stop abandons the
            // in-flight request instead of applying its result late.
            let result = tokio::select! {
                result = self.probe_once(&url) => result,
                _ = stop.recv() => break,
            };

            metrics::record_probe(url.as_str(), result.latency_ms, result.error.as_ref());
            self.registry.apply_result(id, &result);
        }
    }

    /// Issue a single probe and classify the outcome.
    async fn probe_once(&self, base_url: &Url) -> HealthCheckResult {
        let probe_url = match base_url.join(&self.config.path) {
            Ok(url) => url,
            Err(e) => {
                return HealthCheckResult::failure(ProbeError::Connection(e.to_string()), None);
            }
        };
        let method =
            Method::from_bytes(self.config.method.as_bytes()).unwrap_or(Method::GET);
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let start = Instant::now();
        let response = tokio::time::timeout(
            timeout,
            self.client.request(method, probe_url).send(),
        )
        .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match response {
            Ok(Ok(response)) => {
                let status = response.status().as_u16();
                if status == self.config.success_status {
                    HealthCheckResult::success(status, latency_ms)
                } else {
                    tracing::warn!(
                        target = %base_url,
                        status,
                        "health probe failed: unexpected status"
                    );
                    HealthCheckResult::failure(ProbeError::BadStatus(status), Some(latency_ms))
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(target = %base_url, error = %e, "health probe failed: connection error");
                HealthCheckResult::failure(ProbeError::Connection(e.to_string()), Some(latency_ms))
            }
            Err(_) => {
                tracing::warn!(
                    target = %base_url,
                    timeout_ms = self.config.timeout_ms,
                    "health probe failed: timeout"
                );
                HealthCheckResult::failure(ProbeError::Timeout, None)
            }
        }
    }
}

impl std::fmt::Debug for HealthProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthProber")
            .field("targets", &self.registry.len())
            .field("enabled", &self.config.enabled)
            .field("stopped", &self.stopped.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
