//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LookupConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{BreakerConfig, LookupConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
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

pub fn validate_config(config: &LookupConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.app.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("app.bind_address", "must be a socket address"));
    }
    if config.store.collection.is_empty() {
        errors.push(ValidationError::new("store.collection", "must not be empty"));
    }
    if config.store.op_timeout_ms == 0 {
        errors.push(ValidationError::new("store.op_timeout_ms", "must be greater than 0"));
    }
    if Url::parse(&config.remote.base_url).is_err() {
        errors.push(ValidationError::new("remote.base_url", "must be an absolute URL"));
    }
    if config.remote.timeout_ms == 0 {
        errors.push(ValidationError::new("remote.timeout_ms", "must be greater than 0"));
    }
    if config.write_back.timeout_ms == 0 {
        errors.push(ValidationError::new("write_back.timeout_ms", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    validate_breaker("breakers.store", &config.breakers.store, &mut errors);
    validate_breaker("breakers.remote", &config.breakers.remote, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_breaker(prefix: &str, breaker: &BreakerConfig, errors: &mut Vec<ValidationError>) {
    if breaker.max_requests == 0 {
        errors.push(ValidationError::new(
            format!("{}.max_requests", prefix),
            "must be greater than 0",
        ));
    }
    if breaker.open_timeout_ms == 0 {
        errors.push(ValidationError::new(
            format!("{}.open_timeout_ms", prefix),
            "must be greater than 0",
        ));
    }
    if !(breaker.failure_ratio > 0.0 && breaker.failure_ratio <= 1.0) {
        errors.push(ValidationError::new(
            format!("{}.failure_ratio", prefix),
            "must be in (0.0, 1.0]",
        ));
    }
}
