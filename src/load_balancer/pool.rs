//! Endpoint set management.
//!
//! # Responsibilities
//! - Hold the ordered endpoint set behind an atomic pointer swap
//! - Hand every call one consistent snapshot

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::load_balancer::endpoint::Endpoint;

/// Immutable snapshot of the endpoint set.
#[derive(Debug)]
pub struct EndpointSet {
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointSet {
    /// Endpoints in configured order.
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Owner of the current endpoint set.
#[derive(Debug)]
pub struct EndpointPool {
    current: ArcSwap<EndpointSet>,
}

impl EndpointPool {
    /// Create a pool from endpoint addresses.
    pub fn new(addresses: &[String]) -> Result<Self> {
        let set = build_set(addresses, &[])?;
        Ok(Self {
            current: ArcSwap::from_pointee(set),
        })
    }

    /// Current snapshot. Later replacements do not affect it.
    pub fn snapshot(&self) -> Arc<EndpointSet> {
        self.current.load_full()
    }

    /// Normalised addresses of the current set.
    pub fn addresses(&self) -> Vec<String> {
        self.current
            .load()
            .endpoints
            .iter()
            .map(|e| e.address().to_string())
            .collect()
    }

    /// Atomically replace the endpoint set.
    ///
    /// Endpoints present in both sets keep their health state.
    pub fn replace(&self, addresses: &[String]) -> Result<()> {
        let previous = self.current.load_full();
        let set = build_set(addresses, &previous.endpoints)?;
        tracing::info!(
            endpoints = ?set.endpoints.iter().map(|e| e.address()).collect::<Vec<_>>(),
            "Endpoint set replaced"
        );
        self.current.store(Arc::new(set));
        Ok(())
    }
}

fn build_set(addresses: &[String], previous: &[Arc<Endpoint>]) -> Result<EndpointSet> {
    if addresses.is_empty() {
        return Err(Error::InvalidArgument(
            "endpoint set must contain at least one endpoint".into(),
        ));
    }
    let mut endpoints: Vec<Arc<Endpoint>> = Vec::with_capacity(addresses.len());
    for address in addresses {
        let parsed = Endpoint::parse(address)?;
        if endpoints.iter().any(|e| e.address() == parsed.address()) {
            tracing::warn!(endpoint = %parsed, "Ignoring duplicate endpoint");
            continue;
        }
        let endpoint = previous
            .iter()
            .find(|e| e.address() == parsed.address())
            .cloned()
            .unwrap_or_else(|| Arc::new(parsed));
        endpoints.push(endpoint);
    }
    Ok(EndpointSet { endpoints })
}
