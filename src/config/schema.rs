//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a connection.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::protocol::Protocol;

/// Root configuration for a connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Endpoint addresses in priority order (e.g., "http://127.0.0.1:8529").
    pub endpoints: Vec<String>,

    /// Transport and wire encoding ("http+json", "http+cbor", "http2+cbor").
    pub protocol: Protocol,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Endpoint health bookkeeping.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["http://127.0.0.1:8529".to_string()],
            protocol: Protocol::default(),
            timeouts: TimeoutConfig::default(),
            health: HealthConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Per-attempt timeout (one endpoint, request and response) in milliseconds.
    pub request_ms: u64,

    /// Idle pooled connection timeout in seconds.
    pub pool_idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 5_000,
            request_ms: 30_000,
            pool_idle_secs: 90,
        }
    }
}

/// Passive endpoint health settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Number of consecutive transport failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Number of consecutive successes before marking healthy.
    pub healthy_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            unhealthy_threshold: 1,
            healthy_threshold: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
