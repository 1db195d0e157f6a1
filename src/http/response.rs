//! Response parsing.
//!
//! # Responsibilities
//! - Expose status, serving endpoint and headers of a completed exchange
//! - Turn unexpected statuses into typed errors (service envelope or excerpt)
//! - Decode the body, a top-level field of it, or each element of a batch
//!
//! # Design Decisions
//! - Batch children own a copy of their element bytes and carry no headers
//! - A child's status comes from its element (`error` + `code`) when present
//! - Raw parsing copies bytes and never re-encodes whole bodies

use bytes::Bytes;
use hyper::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::codec::{Codec, RawPayload, Shape};
use crate::error::{Error, Result, ServerError};

/// Maximum number of characters of a body quoted in an error.
const EXCERPT_LEN: usize = 256;

/// Error envelope returned by the database service.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: bool,
    #[serde(default)]
    code: Option<u16>,
    #[serde(rename = "errorNum", default)]
    error_num: Option<i64>,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

/// Per-element status fields of a batch reply.
#[derive(Debug, Deserialize)]
struct ElementStatus {
    error: Option<bool>,
    code: Option<u16>,
}

/// A completed exchange, or one element of a batch reply.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    endpoint: String,
    headers: Option<HeaderMap>,
    body: Bytes,
    codec: Codec,
}

impl Response {
    pub(crate) fn new(
        status: u16,
        endpoint: impl Into<String>,
        headers: HeaderMap,
        body: Bytes,
        codec: Codec,
    ) -> Self {
        Self {
            status,
            endpoint: endpoint.into(),
            headers: Some(headers),
            body,
            codec,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Address of the endpoint that produced this response.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Header value, or `""` when absent. Batch children have no headers.
    pub fn header(&self, key: &str) -> &str {
        self.headers
            .as_ref()
            .and_then(|h| h.get(key))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// True for responses produced by [`Response::parse_array_body`].
    pub fn is_child(&self) -> bool {
        self.headers.is_none()
    }

    /// Ok when the status is one of `accepted`.
    pub fn check_status(&self, accepted: &[u16]) -> Result<()> {
        if accepted.contains(&self.status) {
            return Ok(());
        }
        match self.codec.decode::<ErrorEnvelope>(&self.body) {
            Ok(envelope) if envelope.error => Err(Error::Server(ServerError {
                status: self.status,
                code: envelope.code.unwrap_or(self.status),
                error_num: envelope.error_num.unwrap_or(0),
                message: envelope.error_message.unwrap_or_default(),
            })),
            _ => Err(Error::UnexpectedStatus {
                status: self.status,
                body_excerpt: self.codec.excerpt(&self.body, EXCERPT_LEN),
            }),
        }
    }

    /// Decode the body (empty `field`) or one top-level field of an object body.
    pub fn parse_body<T: DeserializeOwned>(&self, field: &str) -> Result<T> {
        let bytes = self.select(field)?;
        self.codec.decode(bytes.as_ref())
    }

    /// Like [`Response::parse_body`], but copies the selected bytes into `target`.
    pub fn parse_raw_body(&self, field: &str, target: Option<&mut RawPayload>) -> Result<()> {
        let Some(target) = target else {
            return Err(Error::InvalidTarget("raw payload receiver is absent"));
        };
        let bytes = self.select(field)?;
        RawPayload::unmarshal(Some(target), bytes.as_ref())
    }

    /// Split an array body into one child response per element.
    pub fn parse_array_body(&self) -> Result<Vec<Response>> {
        let elements = self.codec.split_array(&self.body)?;
        Ok(elements
            .into_iter()
            .map(|element| {
                let status = match self.codec.decode::<ElementStatus>(&element) {
                    Ok(ElementStatus {
                        error: Some(_),
                        code: Some(code),
                    }) => code,
                    _ => self.status,
                };
                Response {
                    status,
                    endpoint: self.endpoint.clone(),
                    headers: None,
                    body: Bytes::from(element),
                    codec: self.codec,
                }
            })
            .collect())
    }

    fn select(&self, field: &str) -> Result<Bytes> {
        if field.is_empty() {
            let shape = self.codec.shape(&self.body);
            if shape == Shape::Array {
                return Err(Error::TypeMismatch {
                    expected: "non-array",
                    found: shape.name(),
                });
            }
            return Ok(self.body.clone());
        }
        match self.codec.field(&self.body, field)? {
            Some(bytes) => Ok(Bytes::from(bytes)),
            None => Err(Error::NotFound(field.to_string())),
        }
    }
}
