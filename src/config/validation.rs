//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every endpoint address parses
//! - Validate value ranges (timeouts > 0, thresholds > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConnectionConfig → Result<(), Vec<ValidationError>>
//! - Runs before a connection is built from the config

use thiserror::Error;

use crate::config::schema::ConnectionConfig;
use crate::load_balancer::endpoint::Endpoint;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "timeouts.request_ms").
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every violation.
pub fn validate_config(config: &ConnectionConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(ValidationError::new("endpoints", "at least one endpoint is required"));
    }
    for (i, address) in config.endpoints.iter().enumerate() {
        if let Err(e) = Endpoint::parse(address) {
            errors.push(ValidationError::new(format!("endpoints[{}]", i), e.to_string()));
        }
    }

    let timeouts = &config.timeouts;
    if timeouts.connect_ms == 0 {
        errors.push(ValidationError::new("timeouts.connect_ms", "must be greater than 0"));
    }
    if timeouts.request_ms == 0 {
        errors.push(ValidationError::new("timeouts.request_ms", "must be greater than 0"));
    }

    if config.health.unhealthy_threshold == 0 {
        errors.push(ValidationError::new("health.unhealthy_threshold", "must be greater than 0"));
    }
    if config.health.healthy_threshold == 0 {
        errors.push(ValidationError::new("health.healthy_threshold", "must be greater than 0"));
    }

    if config.observability.log_level.trim().is_empty() {
        errors.push(ValidationError::new("observability.log_level", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
