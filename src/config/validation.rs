//! Configuration validation
//!
//! Validates a jirabridge configuration for correctness:
//! - Tracker URLs are http(s) and distinct
//! - Project keys and tokens are present
//! - Token environment references resolve (warning only)
//! - Listener address and timeout are usable

use super::bridge_config::BridgeConfig;
use super::tracker_endpoint::TrackerEndpoint;
use crate::BridgeError;
use std::net::SocketAddr;

/// Validation error details
#[derive(Debug, Clone)]
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

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a bridge configuration
pub fn validate_config(config: &BridgeConfig) -> ValidationResult {
    let mut errors = Vec::new();

    validate_endpoint("tracker_a", &config.tracker_a, &mut errors);
    validate_endpoint("tracker_b", &config.tracker_b, &mut errors);

    if config.tracker_a.base_url() == config.tracker_b.base_url() {
        errors.push(ValidationError::new(
            "tracker_b.url",
            format!(
                "Both trackers point at the same instance: {}",
                config.tracker_b.base_url()
            ),
        ));
    }

    match config.server.bind.parse::<SocketAddr>() {
        Ok(addr) if addr.port() == 0 => {
            errors.push(ValidationError::new(
                "server.bind",
                "Port must be greater than 0",
            ));
        }
        Ok(_) => {}
        Err(_) => {
            errors.push(ValidationError::new(
                "server.bind",
                format!("Invalid listen address: {}", config.server.bind),
            ));
        }
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "request_timeout_secs",
            "Timeout must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_endpoint(field: &str, endpoint: &TrackerEndpoint, errors: &mut Vec<ValidationError>) {
    if !endpoint.url.starts_with("http://") && !endpoint.url.starts_with("https://") {
        errors.push(ValidationError::new(
            format!("{}.url", field),
            format!("Invalid Jira URL: {}", endpoint.url),
        ));
    }

    if endpoint.project_key.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{}.project_key", field),
            "Project key cannot be empty",
        ));
    }

    if endpoint.issue_type.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{}.issue_type", field),
            "Issue type cannot be empty",
        ));
    }

    match endpoint.token_env_var() {
        Some("") => errors.push(ValidationError::new(
            format!("{}.token", field),
            "Token reference names no environment variable",
        )),
        Some(var) => {
            if std::env::var(var).is_err() {
                tracing::warn!(
                    tracker = %endpoint.name,
                    env_var = %var,
                    "Token environment variable not set (this may be intentional if set at runtime)"
                );
            }
        }
        None if endpoint.token.is_empty() => errors.push(ValidationError::new(
            format!("{}.token", field),
            "Token cannot be empty",
        )),
        None => {}
    }
}

/// Validate and convert to a crate Result
pub fn validate_config_result(config: &BridgeConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        BridgeError::Config(format!(
            "Configuration validation failed:\n  {}",
            messages.join("\n  ")
        ))
    })
}
