//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check addresses and media types parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::codec::MediaType;
use crate::config::schema::ServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::new("limits.max_body_size", "must be greater than 0"));
    }

    if config.controller.accepted_content_types.is_empty() {
        errors.push(ValidationError::new(
            "controller.accepted_content_types",
            "at least one media type is required",
        ));
    }
    for value in &config.controller.accepted_content_types {
        if let Err(e) = value.parse::<MediaType>() {
            errors.push(ValidationError::new("controller.accepted_content_types", e.to_string()));
        }
    }
    if let Err(e) = config.controller.response_content_type.parse::<MediaType>() {
        errors.push(ValidationError::new("controller.response_content_type", e.to_string()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if !matches!(
        config.observability.log_format.as_str(),
        "pretty" | "compact" | "full"
    ) {
        errors.push(ValidationError::new(
            "observability.log_format",
            "expected one of: pretty, compact, full",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "localhost".into();
        config.timeouts.request_secs = 0;
        config.controller.response_content_type = "json".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "listener.bind_address",
                "timeouts.request_secs",
                "controller.response_content_type",
                "observability.metrics_address",
            ]
        );
    }
}
