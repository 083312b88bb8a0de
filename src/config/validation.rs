//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BankConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::BankConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: &'static str },

    #[error("listener.accept_backoff_base_ms ({base}) exceeds accept_backoff_max_ms ({max})")]
    BackoffRange { base: u64, max: u64 },

    #[error("observability.log_level: unknown level `{0}`")]
    UnknownLogLevel(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &BankConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::MustBePositive {
            field: "listener.max_connections",
        });
    }

    if config.listener.accept_backoff_base_ms > config.listener.accept_backoff_max_ms {
        errors.push(ValidationError::BackoffRange {
            base: config.listener.accept_backoff_base_ms,
            max: config.listener.accept_backoff_max_ms,
        });
    }

    if config.snapshot.enabled && config.snapshot.interval_secs == 0 {
        errors.push(ValidationError::MustBePositive {
            field: "snapshot.interval_secs",
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
