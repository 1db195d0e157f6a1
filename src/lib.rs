//! Client transport core for multi-node database services.
//!
//! A [`Connection`] turns [`Request`]s into [`Response`]s over an ordered set
//! of endpoints, failing over on transport errors. Bodies are encoded with
//! the connection's [`Codec`] (JSON or CBOR), and [`RawPayload`] carries
//! already encoded values through untouched.

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod protocol;

pub use auth::Authentication;
pub use client::Connection;
pub use codec::{Codec, Fragment, RawPayload};
pub use config::ConnectionConfig;
pub use error::{Error, Result, ServerError};
pub use http::{Request, Response};
pub use lifecycle::{CancelHandle, Context};
pub use net::{Transport, TransportError};
pub use protocol::{Protocol, ProtocolSet};
