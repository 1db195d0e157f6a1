//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Connection::execute
//!     → transport.rs (WireRequest, Transport trait, failure classes)
//!     → http_transport.rs (hyper-util pooled client, HTTP/1.1 or HTTP/2)
//!     → WireResponse (status, headers, collected body)
//! ```
//!
//! # Design Decisions
//! - The transport is a trait object so tests and embedders can inject their own
//! - Connection pooling and keep-alive belong to the transport, not the connection
//! - TLS endpoints are rejected by the plain HTTP transport

pub mod http_transport;
pub mod transport;

pub use http_transport::HttpTransport;
pub use transport::{Transport, TransportError, WireRequest, WireResponse};
