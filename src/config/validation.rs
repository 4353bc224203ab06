//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check target URLs parse
//! - Validate value ranges (intervals > 0, thresholds > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RoutingConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::RoutingConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no targets configured")]
    NoTargets,

    #[error("target {index}: invalid url '{url}': {reason}")]
    InvalidTargetUrl {
        index: usize,
        url: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("health check path '{0}' must start with '/'")]
    InvalidProbePath(String),

    #[error("health check method '{0}' must be GET, HEAD or OPTIONS")]
    InvalidProbeMethod(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &RoutingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.targets.is_empty() {
        errors.push(ValidationError::NoTargets);
    }

    for (index, target) in config.targets.iter().enumerate() {
        if let Err(e) = Url::parse(&target.url) {
            errors.push(ValidationError::InvalidTargetUrl {
                index,
                url: target.url.clone(),
                reason: e.to_string(),
            });
        }
    }

    let hc = &config.health_check;
    if hc.interval_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "health_check.interval_ms",
        });
    }
    if hc.timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "health_check.timeout_ms",
        });
    }
    if hc.unhealthy_threshold == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "health_check.unhealthy_threshold",
        });
    }
    if hc.healthy_threshold == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "health_check.healthy_threshold",
        });
    }
    if !hc.path.starts_with('/') {
        errors.push(ValidationError::InvalidProbePath(hc.path.clone()));
    }
    if !matches!(hc.method.as_str(), "GET" | "HEAD" | "OPTIONS") {
        errors.push(ValidationError::InvalidProbeMethod(hc.method.clone()));
    }

    if config.sticky_session.enabled && config.sticky_session.reset_interval_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "sticky_session.reset_interval_ms",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
