//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single server node a connection may dispatch to
//! - Build per-call URLs from the node's base URL
//! - Track health state (Healthy/Unhealthy) from dispatch outcomes

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use url::Url;

use crate::error::{Error, Result};

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// A single server node.
#[derive(Debug)]
pub struct Endpoint {
    /// Address as configured, normalised (`tcp://` → `http://`, no trailing `/`).
    address: String,
    /// Parsed base URL.
    url: Url,

    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    /// Consecutive failure count.
    consecutive_failures: AtomicUsize,
    /// Consecutive success count.
    consecutive_successes: AtomicUsize,
}

impl Endpoint {
    /// Parse an endpoint address such as `http://10.0.0.1:8529` or `tcp://db:8529`.
    pub fn parse(address: &str) -> Result<Self> {
        let trimmed = address.trim();
        let normalized = if let Some(rest) = trimmed.strip_prefix("tcp://") {
            format!("http://{}", rest)
        } else if let Some(rest) = trimmed.strip_prefix("ssl://") {
            format!("https://{}", rest)
        } else {
            trimmed.to_string()
        };

        let url = Url::parse(&normalized)
            .map_err(|e| Error::InvalidArgument(format!("invalid endpoint '{}': {}", address, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidArgument(format!(
                "invalid endpoint '{}': unsupported scheme '{}'",
                address,
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(Error::InvalidArgument(format!(
                "invalid endpoint '{}': missing host",
                address
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(Error::InvalidArgument(format!(
                "invalid endpoint '{}': query and fragment are not allowed",
                address
            )));
        }

        Ok(Self {
            address: normalized.trim_end_matches('/').to_string(),
            url,
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
        })
    }

    /// Normalised address string.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL for `path` (relative to the base path) with `query` appended in order.
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Url {
        let mut url = self.url.clone();
        let base = url.path().trim_end_matches('/').to_string();
        let suffix = path.trim_start_matches('/');
        url.set_path(&format!("{}/{}", base, suffix));
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }

    // --- Health Logic ---

    /// Current health state.
    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Return true if the endpoint is considered healthy (Healthy or Unknown).
    pub fn is_healthy(&self) -> bool {
        self.health() != HealthState::Unhealthy
    }

    /// Report a completed exchange. Returns true on a transition to Healthy.
    pub fn mark_success(&self, healthy_threshold: usize) -> bool {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.health() == HealthState::Healthy {
            return false;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            self.consecutive_successes.store(0, Ordering::Relaxed);
            return true;
        }
        false
    }

    /// Report a transport failure. Returns true on a transition to Unhealthy.
    pub fn mark_failure(&self, unhealthy_threshold: usize) -> bool {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.health() == HealthState::Unhealthy {
            return false;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            self.consecutive_failures.store(0, Ordering::Relaxed);
            return true;
        }
        false
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
