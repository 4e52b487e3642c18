//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. All errors are
//! collected so a bad file is reported in one pass.

use alloy::primitives::Address;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<url::Url>() {
        errors.push(ValidationError {
            field,
            message: format!("invalid URL '{}': {}", value, e),
        });
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.chain_id == 0 {
        errors.push(ValidationError {
            field: "network.chain_id",
            message: "must be non-zero".to_string(),
        });
    }
    check_url(&mut errors, "network.rpc_url", &config.network.rpc_url);
    for url in &config.network.failover_urls {
        check_url(&mut errors, "network.failover_urls", url);
    }
    check_url(&mut errors, "network.explorer_url", &config.network.explorer_url);

    if let Err(e) = config.contract.address.parse::<Address>() {
        errors.push(ValidationError {
            field: "contract.address",
            message: format!("invalid address '{}': {}", config.contract.address, e),
        });
    }

    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError {
            field: "rpc.timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    let confirmation = &config.confirmation;
    if confirmation.timeout_secs == 0 {
        errors.push(ValidationError {
            field: "confirmation.timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }
    if confirmation.confirmation_blocks == 0 {
        errors.push(ValidationError {
            field: "confirmation.confirmation_blocks",
            message: "must be at least 1".to_string(),
        });
    }
    if confirmation.poll_base_ms == 0 || confirmation.poll_base_ms > confirmation.poll_max_ms {
        errors.push(ValidationError {
            field: "confirmation.poll_base_ms",
            message: format!(
                "must be in 1..={} (poll_max_ms)",
                confirmation.poll_max_ms
            ),
        });
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError {
            field: "observability.log_format",
            message: format!(
                "unknown format '{}', expected 'pretty' or 'json'",
                config.observability.log_format
            ),
        });
    }
    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError {
                field: "observability.metrics_address",
                message: format!("invalid socket address '{}'", addr),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
