//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (durations > 0, burst >= 1, port numeric)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem found in a loaded config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("SERVE_ADDRESS is empty")]
    EmptyAddress,

    #[error("SERVE_ADDRESS `{0}` is not host:port")]
    InvalidAddress(String),

    #[error("rate_limit.burst must be at least 1")]
    ZeroBurst,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed config for values that would cripple the server.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_address(&config.serve_address) {
        errors.push(e);
    }

    if config.rate_limit.enabled {
        if config.rate_limit.burst == 0 {
            errors.push(ValidationError::ZeroBurst);
        }
        if config.rate_limit.refill_interval_secs == 0 {
            errors.push(ValidationError::ZeroDuration("rate_limit.refill_interval_secs"));
        }
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("timeouts.read_secs", timeouts.read_secs),
        ("timeouts.write_secs", timeouts.write_secs),
        ("timeouts.idle_secs", timeouts.idle_secs),
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.drain_secs", timeouts.drain_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration(name));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accepts `host:port` where host may be a name (`localhost`), an IPv4
/// address, a bracketed IPv6 address, or empty (all interfaces).
fn validate_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::EmptyAddress);
    }

    let invalid = || ValidationError::InvalidAddress(address.to_string());
    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;

    port.parse::<u16>().map_err(|_| invalid())?;
    if host.contains(char::is_whitespace) || (host.contains(':') && !host.starts_with('[')) {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts_pass() {
        assert!(validate_config(&AppConfig::new("localhost:4343")).is_ok());
        assert!(validate_config(&AppConfig::new(":4343")).is_ok());
        assert!(validate_config(&AppConfig::new("[::1]:4343")).is_ok());
    }

    #[test]
    fn rejects_address_without_port() {
        let errors = validate_config(&AppConfig::new("localhost")).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidAddress("localhost".into())]);

        let errors = validate_config(&AppConfig::new("localhost:http")).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn collects_every_error() {
        let mut config = AppConfig::new("");
        config.rate_limit.burst = 0;
        config.timeouts.drain_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyAddress,
                ValidationError::ZeroBurst,
                ValidationError::ZeroDuration("timeouts.drain_secs"),
            ]
        );
    }

    #[test]
    fn disabled_rate_limit_skips_bucket_checks() {
        let mut config = AppConfig::new("127.0.0.1:0");
        config.rate_limit.enabled = false;
        config.rate_limit.burst = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::new("127.0.0.1:0");
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidMetricsAddress("nope".into())]
        );
    }
}
