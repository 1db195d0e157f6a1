//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ConnectionConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ConnectionConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), endpoints = config.endpoints.len(), "Configuration loaded");
    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ConnectionConfig, ConfigError> {
    let config: ConnectionConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Protocol;

    #[test]
    fn test_parse_minimal() {
        let config = parse_config("").unwrap();
        assert_eq!(config.endpoints, vec!["http://127.0.0.1:8529"]);
        assert_eq!(config.protocol, Protocol::Http1Json);
        assert_eq!(config.timeouts.request_ms, 30_000);
    }

    #[test]
    fn test_parse_full() {
        let config = parse_config(
            r#"
            endpoints = ["tcp://db1:8529", "http://db2:8529"]
            protocol = "http2+cbor"

            [timeouts]
            request_ms = 2500

            [health]
            unhealthy_threshold = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.protocol, Protocol::Http2Cbor);
        assert_eq!(config.timeouts.request_ms, 2500);
        assert_eq!(config.timeouts.connect_ms, 5_000);
        assert_eq!(config.health.unhealthy_threshold, 3);
        assert_eq!(config.health.healthy_threshold, 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_config("protocol = \"carrier-pigeon\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            parse_config("endpoints = []"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/dbwire.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }

    #[test]
    fn test_validation_message_lists_every_error() {
        let err = parse_config(
            r#"
            endpoints = []
            [timeouts]
            connect_ms = 0
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: endpoints: at least one endpoint is required, \
             timeouts.connect_ms: must be greater than 0"
        );
    }
}
