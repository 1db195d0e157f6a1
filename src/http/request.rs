//! Request builder.
//!
//! # Responsibilities
//! - Accumulate method, path, query parameters and headers for one call
//! - Encode bodies with the connection's codec (single value, merged
//!   fragments, arrays with per-element overlays, bulk import framing)
//! - Expose whether the body has been fully written by the transport
//!
//! # Design Decisions
//! - Query keys are unique and insertion ordered; the last write wins
//! - Header keys are unique case-insensitively; the last write wins
//! - Bodies are encoded eagerly so encoding errors surface at the setter
//! - A clone is an independent snapshot with its own `written` flag

use bytes::Bytes;
use ciborium::Value;
use hyper::Method;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::codec::document::{merge_first_wins, overlay};
use crate::codec::{Codec, Fragment, RawPayload};
use crate::error::{Error, Result};

/// Header carrying the per-call correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

#[derive(Debug, Clone)]
struct Body {
    bytes: Bytes,
    content_type: &'static str,
}

/// A request under construction. Created by `Connection::new_request`.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    codec: Codec,
    written: Arc<AtomicBool>,
}

impl Request {
    pub(crate) fn new(method: Method, path: String, codec: Codec) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            codec,
            written: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Codec the body is encoded with.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Set a query parameter, replacing an earlier value for the same key.
    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.query.push((key, value)),
        }
        self
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameters in insertion order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Set a header, replacing an earlier value whose key matches case-insensitively.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(slot) => *slot = (key, value),
            None => self.headers.push((key, value)),
        }
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    // --- Bodies ---

    /// Body with a single structured value.
    pub fn set_body<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<&mut Self> {
        let bytes = self.codec.encode(body)?;
        Ok(self.store_body(bytes, self.codec.content_type()))
    }

    /// Body with an already encoded payload, sent without re-encoding.
    pub fn set_raw_body(&mut self, payload: RawPayload) -> &mut Self {
        let bytes = if payload.is_null() {
            self.codec.null_literal().to_vec()
        } else {
            payload.into_bytes()
        };
        self.store_body(bytes, self.codec.content_type())
    }

    /// Body merged from several fragments. The first fragment defining a
    /// top-level key wins.
    pub fn set_body_fragments(&mut self, fragments: &[Fragment<'_>]) -> Result<&mut Self> {
        match fragments {
            [] => {
                self.body = None;
                Ok(self)
            }
            [single] => match single.as_raw() {
                Some(raw) => Ok(self.set_raw_body(raw.clone())),
                None => {
                    let bytes = single.encode(self.codec)?;
                    Ok(self.store_body(bytes, self.codec.content_type()))
                }
            },
            many => {
                let merged = merge_first_wins(self.codec, many)?;
                self.set_body(&merged)
            }
        }
    }

    /// Array body. When `merge` is given it must have one slot per element;
    /// a `Some` slot is overlaid on its element (overlay wins per top-level key).
    pub fn set_body_array<T: Serialize>(
        &mut self,
        items: &[T],
        merge: Option<&[Option<Fragment<'_>>]>,
    ) -> Result<&mut Self> {
        let Some(merge) = merge else {
            return self.set_body(items);
        };
        if merge.len() != items.len() {
            return Err(Error::InvalidArgument(format!(
                "merge list has {} entries for {} array elements",
                merge.len(),
                items.len()
            )));
        }

        let mut documents = Vec::with_capacity(items.len());
        for (index, (item, slot)) in items.iter().zip(merge).enumerate() {
            let base = Fragment::value(item).to_document(self.codec)?;
            let document = match slot {
                Some(fragment) => overlay(base, fragment.to_document(self.codec)?, index)?,
                None => base,
            };
            documents.push(document);
        }
        self.set_body(&Value::Array(documents))
    }

    /// Bulk-import body: one record per element instead of a single array.
    pub fn set_body_import_array<T: Serialize>(&mut self, items: &[T]) -> Result<&mut Self> {
        let bytes = self.codec.encode_import(items)?;
        Ok(self.store_body(bytes, self.codec.import_content_type()))
    }

    /// Encoded body, if one was set.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_ref().map(|b| b.bytes.as_ref())
    }

    pub(crate) fn body_bytes(&self) -> Bytes {
        self.body
            .as_ref()
            .map(|b| b.bytes.clone())
            .unwrap_or_default()
    }

    /// Content type of the body, if one was set.
    pub fn content_type(&self) -> Option<&'static str> {
        self.body.as_ref().map(|b| b.content_type)
    }

    /// True once the transport has handed the whole body to the wire.
    pub fn written(&self) -> bool {
        self.written.load(Ordering::Acquire)
    }

    pub(crate) fn written_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.written)
    }

    fn store_body(&mut self, bytes: Vec<u8>, content_type: &'static str) -> &mut Self {
        self.body = Some(Body {
            bytes: Bytes::from(bytes),
            content_type,
        });
        self
    }
}

impl Clone for Request {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            codec: self.codec,
            written: Arc::new(AtomicBool::new(false)),
        }
    }
}
