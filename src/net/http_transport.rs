//! HTTP transport backed by the hyper-util pooled client.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Frame, SizeHint};
use hyper::Uri;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::config::ConnectionConfig;
use crate::load_balancer::endpoint::Endpoint;
use crate::net::transport::{Transport, TransportError, WireRequest, WireResponse};
use crate::protocol::{Protocol, ProtocolSet};

/// Request body that flips a flag once its last frame has been handed out.
#[derive(Debug)]
pub struct TrackedBody {
    inner: Full<Bytes>,
    written: Arc<AtomicBool>,
}

impl TrackedBody {
    pub fn new(bytes: Bytes, written: Arc<AtomicBool>) -> Self {
        Self {
            inner: Full::new(bytes),
            written,
        }
    }
}

impl Body for TrackedBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if polled.is_ready() && this.inner.is_end_stream() {
            this.written.store(true, Ordering::Release);
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Plain-text HTTP/1.1 or prior-knowledge HTTP/2 transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, TrackedBody>,
    protocol: Protocol,
}

impl HttpTransport {
    /// Build a transport for the protocol and timeouts in `config`.
    pub fn new(config: &ConnectionConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_millis(config.timeouts.connect_ms)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .http2_only(config.protocol.is_http2())
            .pool_idle_timeout(Duration::from_secs(config.timeouts.pool_idle_secs))
            .build(connector);

        tracing::debug!(
            protocol = %config.protocol,
            connect_timeout_ms = config.timeouts.connect_ms,
            "HTTP transport initialized"
        );

        Self {
            client,
            protocol: config.protocol,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: WireRequest,
    ) -> Result<WireResponse, TransportError> {
        if request.url.scheme() != "http" {
            return Err(TransportError::InvalidRequest(format!(
                "scheme '{}' is not supported by the plain HTTP transport ({})",
                request.url.scheme(),
                endpoint
            )));
        }
        let uri: Uri = request
            .url
            .as_str()
            .parse()
            .map_err(|e| TransportError::InvalidRequest(format!("invalid URI: {}", e)))?;

        let mut builder = hyper::Request::builder().method(request.method.clone()).uri(uri);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let body = TrackedBody::new(request.body.clone(), request.written_flag());
        let http_request = builder
            .body(body)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let response = self.client.request(http_request).await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else {
                TransportError::Io(e.to_string())
            }
        })?;
        // A reply means the server consumed the request.
        request.mark_written();

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TransportError::Io(format!("reading response body: {}", e)))?
            .to_bytes();

        Ok(WireResponse {
            status: parts.status.as_u16(),
            headers: parts.headers,
            body,
        })
    }

    fn protocols(&self) -> ProtocolSet {
        ProtocolSet::single(self.protocol)
    }
}
