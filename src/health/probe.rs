//! Probe outcome types and classification.

use thiserror::Error;

/// Why a probe counted as a failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// The probe did not complete within the configured timeout.
    #[error("probe timed out")]
    Timeout,

    /// The connection failed or the request errored before a response.
    #[error("connection error: {0}")]
    Connection(String),

    /// A response arrived with a status other than the configured
    /// success code.
    #[error("unexpected status {0}")]
    BadStatus(u16),
}

impl ProbeError {
    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Timeout => "timeout",
            ProbeError::Connection(_) => "connection",
            ProbeError::BadStatus(_) => "bad_status",
        }
    }
}

/// Outcome of a single health probe. Produced per attempt, consumed once.
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub succeeded: bool,
    pub status_code: Option<u16>,
    pub error: Option<ProbeError>,
    pub latency_ms: Option<u64>,
}

impl HealthCheckResult {
    pub fn success(status_code: u16, latency_ms: u64) -> Self {
        Self {
            succeeded: true,
            status_code: Some(status_code),
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    pub fn failure(error: ProbeError, latency_ms: Option<u64>) -> Self {
        let status_code = match error {
            ProbeError::BadStatus(code) => Some(code),
            _ => None,
        };
        Self {
            succeeded: false,
            status_code,
            error: Some(error),
            latency_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_status_carries_code() {
        let result = HealthCheckResult::failure(ProbeError::BadStatus(503), Some(12));
        assert!(!result.succeeded);
        assert_eq!(result.status_code, Some(503));
        assert_eq!(result.error.unwrap().kind(), "bad_status");
    }

    #[test]
    fn test_timeout_has_no_status() {
        let result = HealthCheckResult::failure(ProbeError::Timeout, None);
        assert_eq!(result.status_code, None);
        assert_eq!(result.error.unwrap().kind(), "timeout");
    }
}
