//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic, including mode names)
//! - Validate value ranges (intervals > 0, delay range ordered, statuses valid)
//! - Detect conflicting sections (blacklist removal without the gate)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PipelineConfig → Result<(), Vec<ValidationError>>
//! - Component constructors re-run the checks for their own section

use std::fmt;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::{
    ApiConfig, BlacklistConfig, GateConfig, ObservabilityConfig, PipelineConfig,
};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate every section of the configuration.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_api(&config.api, &mut errors);
    check_gate(&config.gate, &mut errors);
    check_blacklist(&config.blacklist, &config.gate, &mut errors);
    check_observability(&config.observability, &mut errors);
    into_result(errors)
}

pub fn validate_api(api: &ApiConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_api(api, &mut errors);
    into_result(errors)
}

pub fn validate_gate(gate: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_gate(gate, &mut errors);
    into_result(errors)
}

pub fn validate_blacklist(
    blacklist: &BlacklistConfig,
    gate: &GateConfig,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_blacklist(blacklist, gate, &mut errors);
    into_result(errors)
}

fn into_result(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_api(api: &ApiConfig, errors: &mut Vec<ValidationError>) {
    match Url::parse(api.url.trim()) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "api.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "api.url",
            format!("'{}' is not a valid URL: {}", api.url, e),
        )),
    }
    if api.username.trim().is_empty() {
        errors.push(ValidationError::new("api.username", "is required"));
    }
    if api.password.is_empty() {
        errors.push(ValidationError::new("api.password", "is required"));
    }
    if api.timeout_secs == 0 {
        errors.push(ValidationError::new("api.timeout_secs", "must be greater than 0"));
    }
}

fn check_gate(gate: &GateConfig, errors: &mut Vec<ValidationError>) {
    if gate.refresh_interval_secs == 0 {
        errors.push(ValidationError::new(
            "gate.refresh_interval_secs",
            "must be greater than 0",
        ));
    }
}

fn check_blacklist(
    blacklist: &BlacklistConfig,
    gate: &GateConfig,
    errors: &mut Vec<ValidationError>,
) {
    if !blacklist.enabled {
        return;
    }
    if !gate.enabled {
        errors.push(ValidationError::new(
            "blacklist.enabled",
            "proxy removal requires the admission gate (gate.enabled = true)",
        ));
    }
    if blacklist.http_status_codes.is_empty() {
        errors.push(ValidationError::new(
            "blacklist.http_status_codes",
            "must list at least one status",
        ));
    }
    for code in &blacklist.http_status_codes {
        if !(100..=599).contains(code) {
            errors.push(ValidationError::new(
                "blacklist.http_status_codes",
                format!("{} is not an HTTP status", code),
            ));
        }
    }
    if blacklist.sleep.min_secs > blacklist.sleep.max_secs {
        errors.push(ValidationError::new(
            "blacklist.sleep",
            format!(
                "min {} is greater than max {}",
                blacklist.sleep.min_secs, blacklist.sleep.max_secs
            ),
        ));
    }
}

fn check_observability(obs: &ObservabilityConfig, errors: &mut Vec<ValidationError>) {
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("'{}' must be \"pretty\" or \"json\"", obs.log_format),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }
}
