//! Wire encodings.
//!
//! # Data Flow
//! ```text
//! Request body fragments
//!     → document.rs (fragment → document, shallow merge / overlay)
//!     → Codec::encode (JSON text or CBOR bytes)
//!     → transport
//!
//! Response body bytes
//!     → Codec::shape (object / array / scalar detection)
//!     → Codec::field / Codec::split_array (navigation by field or element)
//!     → Codec::decode (typed result)
//! ```
//!
//! # Design Decisions
//! - The codec is a value selected when a connection is built, never global state
//! - Raw payloads bypass encoding entirely (see raw.rs)
//! - Merging works on `ciborium::Value`, which can hold anything either encoding can

pub mod document;
pub mod raw;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use std::collections::HashMap;

use crate::error::{Error, Result};

pub use document::Fragment;
pub use raw::RawPayload;

/// JSON null literal.
pub const JSON_NULL: &[u8] = b"null";

/// CBOR simple value `null` (major type 7, value 22).
pub const CBOR_NULL: &[u8] = &[0xf6];

/// Active wire encoding of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Text structured encoding.
    Json,
    /// Compact binary self-describing encoding.
    Cbor,
}

/// Top-level shape of an encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
    Scalar,
    Empty,
}

impl Shape {
    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Object => "object",
            Shape::Array => "array",
            Shape::Scalar => "scalar",
            Shape::Empty => "empty",
        }
    }
}

impl Codec {
    /// Content type for regular bodies.
    pub fn content_type(&self) -> &'static str {
        match self {
            Codec::Json => "application/json",
            Codec::Cbor => "application/cbor",
        }
    }

    /// Content type for bulk-import bodies.
    pub fn import_content_type(&self) -> &'static str {
        match self {
            Codec::Json => "application/x-ndjson",
            Codec::Cbor => "application/cbor-seq",
        }
    }

    /// Canonical null representation.
    pub fn null_literal(&self) -> &'static [u8] {
        match self {
            Codec::Json => JSON_NULL,
            Codec::Cbor => CBOR_NULL,
        }
    }

    /// Encode a value.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Json => serde_json::to_vec(value).map_err(|e| Error::Encoding(e.to_string())),
            Codec::Cbor => {
                let mut buf = Vec::new();
                ciborium::into_writer(value, &mut buf)
                    .map_err(|e| Error::Encoding(e.to_string()))?;
                Ok(buf)
            }
        }
    }

    /// Decode a value.
    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        match self {
            Codec::Json => serde_json::from_slice(data).map_err(|e| Error::Decode(e.to_string())),
            Codec::Cbor => {
                let mut rest = data;
                let value =
                    ciborium::from_reader(&mut rest).map_err(|e| Error::Decode(e.to_string()))?;
                if !rest.is_empty() {
                    return Err(Error::Decode(format!(
                        "{} bytes of trailing data after CBOR item",
                        rest.len()
                    )));
                }
                Ok(value)
            }
        }
    }

    /// Detect the top-level shape of `data`.
    ///
    /// JSON is judged by its first significant byte. CBOR is decoded, so a
    /// sequence of items or trailing garbage reports `Scalar`.
    pub fn shape(&self, data: &[u8]) -> Shape {
        match self {
            Codec::Json => match data.iter().find(|b| !b.is_ascii_whitespace()) {
                None => Shape::Empty,
                Some(b'{') => Shape::Object,
                Some(b'[') => Shape::Array,
                Some(_) => Shape::Scalar,
            },
            Codec::Cbor if data.is_empty() => Shape::Empty,
            Codec::Cbor => match self.decode::<ciborium::Value>(data) {
                Ok(value) => cbor_value_shape(&value),
                Err(_) => Shape::Scalar,
            },
        }
    }

    /// Encoded bytes of a top-level field of an object body.
    ///
    /// Returns `Ok(None)` when the body is an object without `field`.
    pub fn field(&self, data: &[u8], field: &str) -> Result<Option<Vec<u8>>> {
        let shape = self.shape(data);
        if shape != Shape::Object {
            return Err(Error::TypeMismatch {
                expected: "object",
                found: shape.name(),
            });
        }
        match self {
            Codec::Json => {
                let map: HashMap<String, &RawValue> =
                    serde_json::from_slice(data).map_err(|e| Error::Decode(e.to_string()))?;
                Ok(map.get(field).map(|raw| raw.get().as_bytes().to_vec()))
            }
            Codec::Cbor => {
                let value = untag(self.decode::<ciborium::Value>(data)?);
                let entries = match value {
                    ciborium::Value::Map(entries) => entries,
                    other => {
                        return Err(Error::TypeMismatch {
                            expected: "object",
                            found: cbor_value_shape(&other).name(),
                        })
                    }
                };
                entries
                    .into_iter()
                    .find(|(k, _)| k.as_text() == Some(field))
                    .map(|(_, v)| self.encode(&v))
                    .transpose()
            }
        }
    }

    /// Split an array body into the encoded bytes of each element.
    pub fn split_array(&self, data: &[u8]) -> Result<Vec<Vec<u8>>> {
        let shape = self.shape(data);
        if shape != Shape::Array {
            return Err(Error::TypeMismatch {
                expected: "array",
                found: shape.name(),
            });
        }
        match self {
            Codec::Json => {
                let elements: Vec<&RawValue> =
                    serde_json::from_slice(data).map_err(|e| Error::Decode(e.to_string()))?;
                Ok(elements
                    .into_iter()
                    .map(|raw| raw.get().as_bytes().to_vec())
                    .collect())
            }
            Codec::Cbor => match untag(self.decode::<ciborium::Value>(data)?) {
                ciborium::Value::Array(elements) => {
                    elements.iter().map(|v| self.encode(v)).collect()
                }
                other => Err(Error::TypeMismatch {
                    expected: "array",
                    found: cbor_value_shape(&other).name(),
                }),
            },
        }
    }

    /// Bulk-import framing: one record per element, not a single array value.
    pub fn encode_import<T: Serialize>(&self, items: &[T]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for item in items {
            buf.extend_from_slice(&self.encode(item)?);
            if *self == Codec::Json {
                buf.push(b'\n');
            }
        }
        Ok(buf)
    }

    /// Human readable excerpt of a body for error messages.
    pub fn excerpt(&self, data: &[u8], max: usize) -> String {
        match self {
            Codec::Json => {
                let text = String::from_utf8_lossy(data);
                if text.chars().count() > max {
                    let cut: String = text.chars().take(max).collect();
                    format!("{}...", cut)
                } else {
                    text.into_owned()
                }
            }
            Codec::Cbor => {
                let take = data.len().min(max / 2);
                let mut hex: String = data[..take].iter().map(|b| format!("{:02x}", b)).collect();
                if take < data.len() {
                    hex.push_str("...");
                }
                hex
            }
        }
    }
}

fn untag(value: ciborium::Value) -> ciborium::Value {
    match value {
        ciborium::Value::Tag(_, inner) => untag(*inner),
        other => other,
    }
}

fn cbor_value_shape(value: &ciborium::Value) -> Shape {
    match value {
        ciborium::Value::Map(_) => Shape::Object,
        ciborium::Value::Array(_) => Shape::Array,
        ciborium::Value::Tag(_, inner) => cbor_value_shape(inner),
        _ => Shape::Scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[test]
    fn test_encode_decode_both_codecs() {
        let doc = Doc {
            name: "alpha".into(),
            count: 3,
        };
        for codec in [Codec::Json, Codec::Cbor] {
            let bytes = codec.encode(&doc).unwrap();
            let back: Doc = codec.decode(&bytes).unwrap();
            assert_eq!(back, doc);
        }
        assert_eq!(
            Codec::Json.encode(&doc).unwrap(),
            br#"{"name":"alpha","count":3}"#.to_vec()
        );
    }

    #[test]
    fn test_shape_detection() {
        assert_eq!(Codec::Json.shape(b"  {\"a\":1}"), Shape::Object);
        assert_eq!(Codec::Json.shape(b"\n[1,2]"), Shape::Array);
        assert_eq!(Codec::Json.shape(b"42"), Shape::Scalar);
        assert_eq!(Codec::Json.shape(b"   "), Shape::Empty);

        let arr = Codec::Cbor.encode(&vec![1, 2]).unwrap();
        let obj = Codec::Cbor
            .encode(&Doc {
                name: "x".into(),
                count: 1,
            })
            .unwrap();
        assert_eq!(Codec::Cbor.shape(&arr), Shape::Array);
        assert_eq!(Codec::Cbor.shape(&obj), Shape::Object);
        assert_eq!(Codec::Cbor.shape(CBOR_NULL), Shape::Scalar);
        assert_eq!(Codec::Cbor.shape(&[]), Shape::Empty);
    }

    #[test]
    fn test_field_navigation() {
        let body = br#"{"result":{"name":"n","count":7},"error":false}"#;
        let field = Codec::Json.field(body, "result").unwrap().unwrap();
        assert_eq!(field, br#"{"name":"n","count":7}"#.to_vec());
        assert!(Codec::Json.field(body, "missing").unwrap().is_none());

        let cbor_body = Codec::Cbor
            .encode(&serde_json::json!({"result": {"name": "n", "count": 7}}))
            .unwrap();
        let field = Codec::Cbor.field(&cbor_body, "result").unwrap().unwrap();
        let doc: Doc = Codec::Cbor.decode(&field).unwrap();
        assert_eq!(doc.count, 7);
    }

    #[test]
    fn test_field_on_array_is_type_mismatch() {
        let err = Codec::Json.field(b"[1]", "x").unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "object",
                found: "array"
            }
        ));
    }

    #[test]
    fn test_split_array_preserves_order() {
        let parts = Codec::Json.split_array(br#"[{"a":1}, 2 ,"three"]"#).unwrap();
        assert_eq!(
            parts,
            vec![br#"{"a":1}"#.to_vec(), b"2".to_vec(), br#""three""#.to_vec()]
        );

        let cbor = Codec::Cbor.encode(&vec!["x", "y", "z"]).unwrap();
        let parts = Codec::Cbor.split_array(&cbor).unwrap();
        let decoded: Vec<String> = parts
            .iter()
            .map(|p| Codec::Cbor.decode(p).unwrap())
            .collect();
        assert_eq!(decoded, vec!["x", "y", "z"]);

        assert!(matches!(
            Codec::Json.split_array(b"{}"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_import_framing() {
        let items = vec![serde_json::json!({"a": 1}), serde_json::json!({"a": 2})];
        let json = Codec::Json.encode_import(&items).unwrap();
        assert_eq!(json, b"{\"a\":1}\n{\"a\":2}\n".to_vec());

        let cbor = Codec::Cbor.encode_import(&items).unwrap();
        let whole_array = Codec::Cbor.encode(&items).unwrap();
        // A CBOR sequence is the array payload without the array header.
        assert_eq!(cbor, whole_array[1..].to_vec());
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(300);
        let ex = Codec::Json.excerpt(long.as_bytes(), 256);
        assert_eq!(ex.len(), 259);
        assert_eq!(Codec::Cbor.excerpt(&[0xde, 0xad], 256), "dead");
    }

    #[test]
    fn test_trailing_data_is_rejected() {
        assert!(matches!(Codec::Json.decode::<u32>(b"1 2"), Err(Error::Decode(_))));
        assert!(matches!(
            Codec::Cbor.decode::<u32>(&[0x01, 0x02]),
            Err(Error::Decode(_))
        ));
        assert_eq!(Codec::Cbor.decode::<u32>(&[0x01]).unwrap(), 1);
    }

    #[test]
    fn test_cbor_sequence_is_not_an_object() {
        let items = vec![serde_json::json!({"a": 1}), serde_json::json!({"a": 2})];
        let sequence = Codec::Cbor.encode_import(&items).unwrap();
        assert_eq!(Codec::Cbor.shape(&sequence), Shape::Scalar);
        assert!(Codec::Cbor.field(&sequence, "a").is_err());
        assert!(Codec::Cbor.decode::<ciborium::Value>(&sequence).is_err());

        let mut padded = Codec::Cbor.encode(&vec![1, 2]).unwrap();
        padded.push(0x00);
        assert!(Codec::Cbor.split_array(&padded).is_err());
    }

    #[test]
    fn test_json_decode_error() {
        let err = Codec::Json.decode::<Doc>(b"{\"name\":1}").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
