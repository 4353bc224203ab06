//! Metrics collection.
//!
//! # Metrics
//! - `balancer_target_health` (gauge): 1=healthy, 0=unhealthy, per target
//! - `balancer_probe_duration_seconds` (histogram): probe latency per target
//! - `balancer_probe_failures_total` (counter): failed probes by target and kind
//! - `balancer_requests_total` (counter): routed requests per target
//! - `balancer_no_healthy_target_total` (counter): selection misses
//!
//! # Design Decisions
//! - Uses the `metrics` facade only; the embedding server decides on
//!   the exporter
//! - Labels carry the target URL and the probe error kind

use metrics::{counter, gauge, histogram};

use crate::health::probe::ProbeError;

pub fn record_target_health(target: &str, healthy: bool) {
    gauge!("balancer_target_health", "target" => target.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_probe(target: &str, latency_ms: Option<u64>, error: Option<&ProbeError>) {
    if let Some(latency_ms) = latency_ms {
        histogram!("balancer_probe_duration_seconds", "target" => target.to_string())
            .record(latency_ms as f64 / 1000.0);
    }
    if let Some(error) = error {
        counter!(
            "balancer_probe_failures_total",
            "target" => target.to_string(),
            "kind" => error.kind()
        )
        .increment(1);
    }
}

pub fn record_request(target: &str) {
    counter!("balancer_requests_total", "target" => target.to_string()).increment(1);
}

pub fn record_no_healthy_target() {
    counter!("balancer_no_healthy_target_total").increment(1);
}
