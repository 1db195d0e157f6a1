//! Connection: the entry point for talking to a database deployment.
//!
//! # Responsibilities
//! - Build requests bound to the connection's codec
//! - Dispatch a request across the endpoint set with failover
//! - Apply the active credential and a correlation id on the wire only
//! - Decode cached payloads with the active codec
//!
//! # Failover Rules
//! - Each endpoint of the call's snapshot is tried at most once
//! - Only transport failures move on to the next endpoint; any HTTP status
//!   is a completed exchange
//! - Cancellation and deadline expiry end the call immediately

use hyper::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::auth::Authentication;
use crate::codec::{Codec, RawPayload};
use crate::config::{validate_config, ConnectionConfig};
use crate::error::{Error, Result};
use crate::http::{Request, Response, X_REQUEST_ID};
use crate::lifecycle::Context;
use crate::load_balancer::pool::EndpointPool;
use crate::net::http_transport::HttpTransport;
use crate::net::transport::{Transport, TransportError, WireRequest};
use crate::observability::metrics;
use crate::protocol::{Protocol, ProtocolSet};

const ALLOWED_METHODS: [&str; 7] = ["GET", "HEAD", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"];

/// State shared by every connection value derived from the same origin.
struct Shared {
    transport: Arc<dyn Transport>,
    endpoints: EndpointPool,
    protocol: Protocol,
    config: ConnectionConfig,
}

/// A multi-endpoint connection.
///
/// Cloning is cheap. Values returned by [`Connection::with_authentication`]
/// share the transport and endpoint set with their origin but carry their
/// own credential.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
    auth: Arc<Authentication>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoints", &self.shared.endpoints.addresses())
            .field("protocol", &self.shared.protocol)
            .field("auth", &self.auth)
            .finish()
    }
}

impl Connection {
    /// Create a connection over an injected transport.
    pub fn new(config: ConnectionConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        validate_config(&config).map_err(|errors| {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            Error::InvalidArgument(format!("invalid configuration: {}", joined.join(", ")))
        })?;
        if !transport.protocols().contains(config.protocol) {
            return Err(Error::InvalidArgument(format!(
                "transport does not support protocol '{}'",
                config.protocol
            )));
        }

        let endpoints = EndpointPool::new(&config.endpoints)?;
        metrics::record_endpoint_count(config.endpoints.len());
        tracing::info!(
            endpoints = ?endpoints.addresses(),
            protocol = %config.protocol,
            "Connection created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                transport,
                endpoints,
                protocol: config.protocol,
                config,
            }),
            auth: Arc::new(Authentication::None),
        })
    }

    /// Create a connection using the built-in HTTP transport.
    pub fn from_config(config: ConnectionConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config);
        Self::new(config, Arc::new(transport))
    }

    /// Codec used for bodies on this connection.
    pub fn codec(&self) -> Codec {
        self.shared.protocol.codec()
    }

    /// Protocols this connection speaks.
    pub fn protocols(&self) -> ProtocolSet {
        ProtocolSet::single(self.shared.protocol)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    pub fn authentication(&self) -> &Authentication {
        &self.auth
    }

    /// Start a request. `method` is an upper case HTTP method name.
    pub fn new_request(&self, method: &str, path: &str) -> Result<Request> {
        if !ALLOWED_METHODS.contains(&method) {
            return Err(Error::InvalidArgument(format!("unsupported method '{}'", method)));
        }
        if path.is_empty() {
            return Err(Error::InvalidArgument("request path is empty".into()));
        }
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| Error::InvalidArgument(format!("invalid method: {}", e)))?;
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Ok(Request::new(method, path, self.codec()))
    }

    /// Send a request, failing over across endpoints on transport errors.
    pub async fn execute(&self, ctx: &Context, req: &Request) -> Result<Response> {
        ctx.check()?;

        let snapshot = self.shared.endpoints.snapshot();
        let request_id = req
            .header(X_REQUEST_ID)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let headers = self.wire_headers(req, &request_id);
        let body = req.body_bytes();
        let per_attempt = Duration::from_millis(self.shared.config.timeouts.request_ms);
        let health = &self.shared.config.health;

        let mut attempts = Vec::new();
        for endpoint in snapshot.endpoints() {
            let wire = WireRequest::new(
                req.method().clone(),
                endpoint.url_for(req.path(), req.query_pairs()),
                headers.clone(),
                body.clone(),
                req.written_flag(),
            );
            tracing::debug!(
                request_id = %request_id,
                method = %req.method(),
                path = req.path(),
                endpoint = %endpoint,
                "Dispatching request"
            );

            let start = Instant::now();
            let outcome = tokio::select! {
                biased;
                err = ctx.done() => {
                    tracing::debug!(request_id = %request_id, endpoint = %endpoint, error = %err, "Call ended by context");
                    return Err(err);
                }
                result = tokio::time::timeout(per_attempt, self.shared.transport.send(endpoint, wire)) => {
                    result.unwrap_or_else(|_| Err(TransportError::Timeout(per_attempt.as_millis() as u64)))
                }
            };

            match outcome {
                Ok(reply) => {
                    if endpoint.mark_success(health.healthy_threshold as usize) {
                        tracing::info!(endpoint = %endpoint, "Endpoint marked healthy");
                        metrics::record_endpoint_health(endpoint.address(), true);
                    }
                    metrics::record_request(endpoint.address(), reply.status, start);
                    return Ok(Response::new(
                        reply.status,
                        endpoint.address(),
                        reply.headers,
                        reply.body,
                        self.codec(),
                    ));
                }
                Err(err) if !err.is_failover_trigger() => {
                    tracing::debug!(request_id = %request_id, endpoint = %endpoint, error = %err, "Request rejected by transport");
                    return Err(Error::Transport(err));
                }
                Err(err) => {
                    tracing::warn!(
                        request_id = %request_id,
                        endpoint = %endpoint,
                        error = %err,
                        "Transport failure, trying next endpoint"
                    );
                    if endpoint.mark_failure(health.unhealthy_threshold as usize) {
                        tracing::warn!(endpoint = %endpoint, "Endpoint marked unhealthy");
                        metrics::record_endpoint_health(endpoint.address(), false);
                    }
                    metrics::record_failover(endpoint.address());
                    attempts.push((endpoint.address().to_string(), err));
                }
            }
        }

        Err(Error::NoEndpointReachable { attempts })
    }

    /// Send a request and decode the whole response body.
    pub async fn execute_decode<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        req: &Request,
    ) -> Result<(Response, T)> {
        let response = self.execute(ctx, req).await?;
        let value = response.parse_body("")?;
        Ok((response, value))
    }

    /// Decode a cached payload with the active codec.
    pub fn unmarshal<T: DeserializeOwned>(&self, data: &RawPayload) -> Result<T> {
        let codec = self.codec();
        codec.decode(data.marshal(codec))
    }

    /// Copy a cached payload into `target`.
    pub fn unmarshal_raw(&self, data: &RawPayload, target: Option<&mut RawPayload>) -> Result<()> {
        RawPayload::unmarshal(target, data.marshal(self.codec()))
    }

    /// Addresses of the current endpoint set.
    pub fn endpoints(&self) -> Vec<String> {
        self.shared.endpoints.addresses()
    }

    /// Replace the endpoint set. Calls already in flight keep their snapshot.
    pub fn update_endpoints(&self, endpoints: Vec<String>) -> Result<()> {
        self.shared.endpoints.replace(&endpoints)?;
        metrics::record_endpoint_count(self.shared.endpoints.snapshot().len());
        Ok(())
    }

    /// A new connection value using `auth`; this value keeps its credential.
    pub fn with_authentication(&self, auth: Authentication) -> Result<Connection> {
        auth.validate()?;
        tracing::debug!(kind = auth.kind(), "Authentication configured");
        Ok(Connection {
            shared: Arc::clone(&self.shared),
            auth: Arc::new(auth),
        })
    }

    fn wire_headers(&self, req: &Request, request_id: &str) -> Vec<(String, String)> {
        let authorization = self.auth.header_value();
        // The connection's credential replaces any caller supplied one.
        let mut headers: Vec<(String, String)> = req
            .headers()
            .iter()
            .filter(|(k, _)| authorization.is_none() || !k.eq_ignore_ascii_case("authorization"))
            .cloned()
            .collect();
        if req.header(X_REQUEST_ID).is_none() {
            headers.push((X_REQUEST_ID.to_string(), request_id.to_string()));
        }
        if let Some(content_type) = req.content_type() {
            if req.header("content-type").is_none() {
                headers.push(("content-type".to_string(), content_type.to_string()));
            }
        }
        if req.header("accept").is_none() {
            headers.push(("accept".to_string(), self.codec().content_type().to_string()));
        }
        if let Some(value) = authorization {
            headers.push(("authorization".to_string(), value));
        }
        headers
    }
}
