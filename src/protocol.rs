//! Protocol identities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::codec::Codec;
use crate::error::Error;

/// Transport plus wire encoding used to talk to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Protocol {
    /// HTTP/1.1 with JSON bodies.
    #[default]
    #[serde(rename = "http+json")]
    Http1Json,
    /// HTTP/1.1 with CBOR bodies.
    #[serde(rename = "http+cbor")]
    Http1Cbor,
    /// HTTP/2 (prior knowledge) with CBOR bodies.
    #[serde(rename = "http2+cbor")]
    Http2Cbor,
}

impl Protocol {
    /// Label of this protocol, e.g. `"http+json"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http1Json => "http+json",
            Protocol::Http1Cbor => "http+cbor",
            Protocol::Http2Cbor => "http2+cbor",
        }
    }

    /// Wire encoding of this protocol.
    pub fn codec(&self) -> Codec {
        match self {
            Protocol::Http1Json => Codec::Json,
            Protocol::Http1Cbor | Protocol::Http2Cbor => Codec::Cbor,
        }
    }

    /// True when the protocol runs over HTTP/2.
    pub fn is_http2(&self) -> bool {
        matches!(self, Protocol::Http2Cbor)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http+json" => Ok(Protocol::Http1Json),
            "http+cbor" => Ok(Protocol::Http1Cbor),
            "http2+cbor" => Ok(Protocol::Http2Cbor),
            other => Err(Error::InvalidArgument(format!("unknown protocol '{}'", other))),
        }
    }
}

/// Set of protocols a connection can use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolSet(BTreeSet<Protocol>);

impl ProtocolSet {
    /// Set containing a single protocol.
    pub fn single(protocol: Protocol) -> Self {
        Self(BTreeSet::from([protocol]))
    }

    /// True when `protocol` is in the set.
    pub fn contains(&self, protocol: Protocol) -> bool {
        self.0.contains(&protocol)
    }

    /// Add a protocol.
    pub fn insert(&mut self, protocol: Protocol) -> bool {
        self.0.insert(protocol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Protocol> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Protocol> for ProtocolSet {
    fn from_iter<I: IntoIterator<Item = Protocol>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
