//! Transport seam.
//!
//! # Responsibilities
//! - Carry one encoded request to one endpoint and bring back the raw reply
//! - Classify failures so the connection knows when to fail over
//! - Report when a request body has been fully handed to the wire

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{HeaderMap, Method};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::load_balancer::endpoint::Endpoint;
use crate::protocol::ProtocolSet;

/// Transport level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection refused, reset, DNS failure and the like.
    #[error("connection failed: {0}")]
    Connect(String),

    /// No reply within the per-attempt timeout (milliseconds).
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// Exchange broke after the connection was established.
    #[error("i/o error: {0}")]
    Io(String),

    /// The request cannot be sent by this transport at all.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// True when the next endpoint should be tried.
    pub fn is_failover_trigger(&self) -> bool {
        !matches!(self, TransportError::InvalidRequest(_))
    }
}

/// An encoded request addressed to one endpoint.
#[derive(Debug)]
pub struct WireRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    written: Arc<AtomicBool>,
}

impl WireRequest {
    pub(crate) fn new(
        method: Method,
        url: Url,
        headers: Vec<(String, String)>,
        body: Bytes,
        written: Arc<AtomicBool>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
            written,
        }
    }

    /// Record that the request has been written completely.
    pub fn mark_written(&self) {
        self.written.store(true, Ordering::Release);
    }

    /// Shared flag behind [`WireRequest::mark_written`].
    pub fn written_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.written)
    }

    /// Value of a header, matched case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// The raw reply to a [`WireRequest`].
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Something that can deliver a [`WireRequest`] to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and wait for the complete reply.
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: WireRequest,
    ) -> Result<WireResponse, TransportError>;

    /// Protocols this transport speaks.
    fn protocols(&self) -> ProtocolSet;
}
