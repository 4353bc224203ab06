//! Routing policy tests at the core's public surface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use proxy_core::health::probe::{HealthCheckResult, ProbeError};
use proxy_core::{DispatchFailure, Dispatcher, GatewayError, ProxyCore, TargetId};

mod common;

/// In-process dispatcher standing in for the forwarding transport.
struct FakeDispatcher {
    fail: AtomicBool,
}

impl FakeDispatcher {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
        }
    }
}

impl Dispatcher for FakeDispatcher {
    type Request = String;
    type Response = String;

    async fn forward(&self, target: &Url, request: String) -> Result<String, DispatchFailure> {
        if self.fail.load(Ordering::SeqCst) {
            Err(DispatchFailure::new("connection refused"))
        } else {
            Ok(format!("{}|{}", target, request))
        }
    }
}

fn mark_down(core: &ProxyCore, id: TargetId) {
    let result = HealthCheckResult::failure(ProbeError::Connection("refused".into()), None);
    core.registry().apply_result(id, &result);
}

fn mark_up(core: &ProxyCore, id: TargetId) {
    core.registry()
        .apply_result(id, &HealthCheckResult::success(200, 1));
}

async fn core_with(addr_count: usize, sticky: bool, failover: bool) -> Arc<ProxyCore> {
    let mut addrs = Vec::new();
    for _ in 0..addr_count {
        addrs.push(common::start_programmable_backend(|| async { (200, "ok".into()) }).await);
    }
    let mut config = common::base_config(&addrs);
    config.sticky_session.enabled = sticky;
    config.failover.enabled = failover;
    config.health_check.unhealthy_threshold = 1;
    config.health_check.healthy_threshold = 1;
    Arc::new(ProxyCore::new(config).unwrap())
}

#[tokio::test]
async fn test_round_robin_distribution() {
    let core = core_with(2, false, false).await;
    assert_eq!(core.select_target("a").unwrap(), TargetId(0));
    assert_eq!(core.select_target("b").unwrap(), TargetId(1));
    assert_eq!(core.select_target("c").unwrap(), TargetId(0));
}

#[tokio::test]
async fn test_affinity_sticks_for_repeat_client() {
    let core = core_with(2, true, false).await;
    let first = core.select_target("ip1").unwrap();
    for _ in 0..5 {
        assert_eq!(core.select_target("ip1").unwrap(), first);
    }
    // Other clients still rotate.
    assert_eq!(core.select_target("ip2").unwrap(), TargetId(1));
}

#[tokio::test]
async fn test_affinity_rebinds_when_cached_target_dies() {
    let core = core_with(2, true, false).await;
    assert_eq!(core.select_target("ip1").unwrap(), TargetId(0));

    mark_down(&core, TargetId(0));
    assert_eq!(core.select_target("ip1").unwrap(), TargetId(1));
    assert_eq!(core.select_target("ip1").unwrap(), TargetId(1));
}

#[tokio::test]
async fn test_failover_always_prefers_secondary_while_primary_down() {
    let core = core_with(2, false, true).await;
    mark_down(&core, TargetId(0));

    for key in ["k1", "k2", "k3", "k4"] {
        assert_eq!(core.select_target(key).unwrap(), TargetId(1));
    }

    mark_up(&core, TargetId(0));
    assert_eq!(core.select_target("k5").unwrap(), TargetId(0));
}

#[tokio::test]
async fn test_all_targets_down_is_service_unavailable() {
    let core = core_with(2, false, false).await;
    mark_down(&core, TargetId(0));
    mark_down(&core, TargetId(1));

    let dispatcher = FakeDispatcher::new();
    let outcome = core
        .route_and_forward("client", "req".to_string(), &dispatcher)
        .await;
    assert!(matches!(outcome, Err(GatewayError::ServiceUnavailable(_))));
}

#[tokio::test]
async fn test_route_and_forward_success() {
    let core = core_with(1, false, false).await;
    let dispatcher = FakeDispatcher::new();

    let response = core
        .route_and_forward("client", "hello".to_string(), &dispatcher)
        .await
        .unwrap();
    assert!(response.ends_with("|hello"));
}

#[tokio::test]
async fn test_dispatch_failure_maps_to_bad_gateway_and_counts() {
    let core = core_with(1, false, false).await;
    let dispatcher = FakeDispatcher::new();
    dispatcher.fail.store(true, Ordering::SeqCst);

    let outcome = core
        .route_and_forward("client", "req".to_string(), &dispatcher)
        .await;
    assert!(matches!(outcome, Err(GatewayError::BadGateway { .. })));

    // The fast path counted the failure without waiting for a probe;
    // with a threshold of 1 the target is already out.
    let snapshot = &core.status_snapshot()[0];
    assert!(!snapshot.healthy);

    // No retry against another target happened, and the next request
    // finds nothing healthy.
    let outcome = core
        .route_and_forward("client", "req".to_string(), &dispatcher)
        .await;
    assert!(matches!(outcome, Err(GatewayError::ServiceUnavailable(_))));
}

#[tokio::test]
async fn test_periodic_reset_drops_affinity() {
    let addrs = [
        common::start_programmable_backend(|| async { (200, "ok".into()) }).await,
        common::start_programmable_backend(|| async { (200, "ok".into()) }).await,
    ];
    let mut config = common::base_config(&addrs);
    config.sticky_session.enabled = true;
    config.sticky_session.reset_interval_ms = 100;
    let core = Arc::new(ProxyCore::new(config).unwrap());
    core.start();

    assert_eq!(core.select_target("ip1").unwrap(), TargetId(0));
    tokio::time::sleep(Duration::from_millis(250)).await;

    // The cached binding was cleared, so the same client falls through
    // to round-robin and lands on the next slot.
    assert_eq!(core.select_target("ip1").unwrap(), TargetId(1));

    core.begin_shutdown();
}
