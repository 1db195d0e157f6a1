//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem for applications embedding the client
//! - Configure log level from config, overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Library code only emits events; installing a subscriber is opt-in
//! - A second initialization is reported, not fatal

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter directive built from config: the crate at `log_level`.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    format!("dbwire={}", config.log_level.trim())
}

/// Install a global fmt subscriber.
///
/// Returns false when a subscriber was already installed.
pub fn init_logging(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let config = ObservabilityConfig {
            log_level: " debug ".into(),
        };
        assert_eq!(default_directive(&config), "dbwire=debug");
    }

    #[test]
    fn test_second_init_is_reported() {
        let config = ObservabilityConfig::default();
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
