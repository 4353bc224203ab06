//! Error taxonomy for the routing core.
//!
//! Probe errors (`health::probe::ProbeError`) are handled locally and
//! never reach a caller; the types here are the ones that surface at
//! the crate boundary. No error in this core is fatal to the process.

use thiserror::Error;

/// Every configured target is currently unhealthy.
///
/// Surfaces to the request caller as a service-unavailable outcome; it
/// is not retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no healthy target available")]
pub struct NoHealthyTarget;

/// Outcome of routing plus forwarding, mapped for the embedding server.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Nothing to route to: respond 503.
    #[error("no healthy target available")]
    ServiceUnavailable(#[from] NoHealthyTarget),

    /// Forwarding to the selected target failed: respond 502. The
    /// request is not transparently retried against another target.
    #[error("dispatch to {target} failed: {reason}")]
    BadGateway { target: String, reason: String },
}

/// Errors constructing the core itself.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid target url '{url}': {source}")]
    InvalidTargetUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("failed to build probe client: {0}")]
    ProbeClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_healthy_target_maps_to_service_unavailable() {
        let err: GatewayError = NoHealthyTarget.into();
        assert!(matches!(err, GatewayError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::BadGateway {
            target: "http://127.0.0.1:3000/".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }
}
