//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! routing core. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the routing core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// Backend target definitions. Order is significant: it defines the
    /// failover primary/secondary and the round-robin rotation order.
    pub targets: Vec<TargetConfig>,

    /// Sticky-session (client affinity) settings.
    pub sticky_session: StickySessionConfig,

    /// Active health check settings.
    pub health_check: HealthCheckConfig,

    /// Failover policy settings.
    pub failover: FailoverConfig,

    /// Shutdown drain settings.
    pub shutdown: ShutdownConfig,
}

/// A single backend target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Backend base URL (e.g., "http://127.0.0.1:3000").
    pub url: String,
}

/// Sticky-session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StickySessionConfig {
    /// Enable client-to-target affinity.
    pub enabled: bool,

    /// Interval at which the whole affinity table is cleared, in
    /// milliseconds. There is no per-entry expiry.
    pub reset_interval_ms: u64,
}

impl Default for StickySessionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            reset_interval_ms: 60_000,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health probes.
    pub enabled: bool,

    /// Probe interval per target in milliseconds.
    pub interval_ms: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path to probe on each target.
    pub path: String,

    /// HTTP method for probes (GET, HEAD or OPTIONS).
    pub method: String,

    /// Exact status code that counts as a successful probe.
    pub success_status: u16,

    /// Consecutive failures before marking a target unhealthy.
    pub unhealthy_threshold: u32,

    /// Consecutive successes before marking a target healthy again.
    pub healthy_threshold: u32,

    /// Skip TLS certificate verification when probing HTTPS targets.
    pub insecure_skip_verify: bool,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 10_000,
            timeout_ms: 5_000,
            path: "/health".to_string(),
            method: "GET".to_string(),
            success_status: 200,
            unhealthy_threshold: 3,
            healthy_threshold: 2,
            insecure_skip_verify: false,
        }
    }
}

/// Failover configuration.
///
/// When enabled and at least two targets are configured, the first
/// target acts as primary and the second as secondary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FailoverConfig {
    /// Enable primary/secondary failover preference.
    pub enabled: bool,
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Grace period for draining connections before forced termination,
    /// in milliseconds.
    pub grace_period_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RoutingConfig::default();
        assert!(config.targets.is_empty());
        assert!(!config.sticky_session.enabled);
        assert_eq!(config.sticky_session.reset_interval_ms, 60_000);
        assert!(config.health_check.enabled);
        assert_eq!(config.health_check.success_status, 200);
        assert_eq!(config.health_check.unhealthy_threshold, 3);
        assert!(!config.failover.enabled);
    }

    #[test]
    fn test_minimal_toml() {
        let config: RoutingConfig = toml::from_str(
            r#"
            [[targets]]
            url = "http://127.0.0.1:3000"

            [failover]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.targets.len(), 1);
        assert!(config.failover.enabled);
        assert_eq!(config.health_check.path, "/health");
    }
}
