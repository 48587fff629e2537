//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint URLs parse and use http(s)
//! - Gas and polling values are in range
//! - The configured chain name resolves to an EVM chain id
//!
//! Returns every problem found, not just the first.

use std::fmt;

use crate::config::registry::ChainRegistry;
use crate::config::schema::{GasPrice, NetworkConfig};

/// A single semantic problem in a loaded config.
#[derive(Debug, Clone, PartialEq)]
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

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}

/// Validate a parsed config.
pub fn validate_config(config: &NetworkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.chain_name.trim().is_empty() {
        errors.push(ValidationError::new("chain_name", "must not be empty"));
    } else if !ChainRegistry::from_config(config).contains(&config.chain_name) {
        errors.push(ValidationError::new(
            "chain_name",
            format!("'{}' has no EVM chain id; add it under [chain_ids]", config.chain_name),
        ));
    }

    check_url(&mut errors, "api_url", &config.api_url);
    check_url(&mut errors, "rpc_url", &config.rpc_url);
    check_url(&mut errors, "evm_rpc_url", &config.evm_rpc_url);
    for (i, url) in config.evm_failover_urls.iter().enumerate() {
        check_url(&mut errors, &format!("evm_failover_urls[{}]", i), url);
    }

    if config.bech32_prefix.is_empty()
        || !config.bech32_prefix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        errors.push(ValidationError::new(
            "bech32_prefix",
            "must be non-empty lowercase alphanumeric",
        ));
    }

    if config.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("rpc_timeout_secs", "must be greater than 0"));
    }

    if config.gas.gas_limit == 0 {
        errors.push(ValidationError::new("gas.gas_limit", "must be greater than 0"));
    }
    if !(config.gas.gas_adjustment.is_finite() && config.gas.gas_adjustment >= 1.0) {
        errors.push(ValidationError::new("gas.gas_adjustment", "must be at least 1.0"));
    }
    if let Err(e) = config.gas.gas_price.parse::<GasPrice>() {
        errors.push(ValidationError::new("gas.gas_price", e));
    }

    if config.poll.interval_ms == 0 {
        errors.push(ValidationError::new("poll.interval_ms", "must be greater than 0"));
    }
    if config.poll.timeout_secs.saturating_mul(1_000) < config.poll.interval_ms {
        errors.push(ValidationError::new(
            "poll.timeout_secs",
            "must not be shorter than the poll interval",
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
    fn test_presets_are_valid() {
        assert!(validate_config(&NetworkConfig::mainnet()).is_ok());
        assert!(validate_config(&NetworkConfig::testnet()).is_ok());
        assert!(validate_config(&NetworkConfig::localnet()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = NetworkConfig::default();
        config.evm_rpc_url = "not a url".to_string();
        config.gas.gas_limit = 0;
        config.gas.gas_price = "cheap".to_string();
        config.poll.interval_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"evm_rpc_url"));
        assert!(fields.contains(&"gas.gas_limit"));
        assert!(fields.contains(&"gas.gas_price"));
        assert!(fields.contains(&"poll.interval_ms"));
    }

    #[test]
    fn test_unknown_chain_name_rejected() {
        let mut config = NetworkConfig::default();
        config.chain_name = "mystery".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "chain_name");

        config.chain_ids.insert("mystery".to_string(), 7);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = NetworkConfig::default();
        config.api_url = "ftp://localhost:1317".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("ftp"));
    }
}
