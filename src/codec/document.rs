//! Body fragments and shallow document merging.
//!
//! # Merge Rules
//! - `merge_first_wins`: fragments combine left to right; a top-level key
//!   keeps the value of the first fragment that defines it
//! - `overlay`: overlay keys replace the base's top-level keys; nested
//!   objects are replaced wholesale, never merged

use ciborium::Value;
use serde::Serialize;

use crate::codec::{Codec, RawPayload};
use crate::error::{Error, Result};

type Render<'a> = Box<dyn Fn(Codec) -> Result<Vec<u8>> + 'a>;

/// One piece of a request body: a structured value or a raw payload.
///
/// Structured values are encoded lazily with the codec of the request they
/// end up in.
pub struct Fragment<'a> {
    render: Render<'a>,
    raw: Option<&'a RawPayload>,
}

impl<'a> Fragment<'a> {
    /// Fragment from any serializable value.
    pub fn value<T: Serialize + ?Sized>(value: &'a T) -> Self {
        Self {
            render: Box::new(move |codec| codec.encode(value)),
            raw: None,
        }
    }

    /// Fragment from an already encoded payload.
    pub fn raw(payload: &'a RawPayload) -> Self {
        Self {
            render: Box::new(move |codec| Ok(payload.marshal(codec).to_vec())),
            raw: Some(payload),
        }
    }

    /// The raw payload, when this fragment is one.
    pub fn as_raw(&self) -> Option<&'a RawPayload> {
        self.raw
    }

    /// Encoded bytes of this fragment alone.
    pub fn encode(&self, codec: Codec) -> Result<Vec<u8>> {
        (self.render)(codec)
    }

    /// Fragment as a document, ready for merging.
    pub(crate) fn to_document(&self, codec: Codec) -> Result<Value> {
        let bytes = self.encode(codec)?;
        codec
            .decode::<Value>(&bytes)
            .map_err(|e| Error::Encoding(format!("fragment is not a valid document: {}", e)))
    }
}

impl std::fmt::Debug for Fragment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fragment")
            .field("raw", &self.raw.is_some())
            .finish()
    }
}

/// Top-level entries of an object document.
fn object_entries(value: Value, what: &str) -> Result<Vec<(Value, Value)>> {
    match value {
        Value::Map(entries) => Ok(entries),
        Value::Null => Ok(Vec::new()),
        _ => Err(Error::Encoding(format!("{} is not an object", what))),
    }
}

/// Merge fragments shallowly; earlier fragments win on key collision.
pub(crate) fn merge_first_wins(codec: Codec, fragments: &[Fragment<'_>]) -> Result<Value> {
    let mut merged: Vec<(Value, Value)> = Vec::new();
    for (i, fragment) in fragments.iter().enumerate() {
        let entries = object_entries(fragment.to_document(codec)?, &format!("body fragment {}", i))?;
        for (key, value) in entries {
            if !merged.iter().any(|(existing, _)| *existing == key) {
                merged.push((key, value));
            }
        }
    }
    Ok(Value::Map(merged))
}

/// Apply `overlay` on top of `base`; overlay wins per top-level key.
pub(crate) fn overlay(base: Value, overlay: Value, index: usize) -> Result<Value> {
    let mut entries = object_entries(base, &format!("array element {}", index))?;
    for (key, value) in object_entries(overlay, &format!("merge overlay {}", index))? {
        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }
    Ok(Value::Map(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_json(codec: Codec, value: &Value) -> serde_json::Value {
        let bytes = codec.encode(value).unwrap();
        match codec {
            Codec::Json => serde_json::from_slice(&bytes).unwrap(),
            Codec::Cbor => codec.decode(&bytes).unwrap(),
        }
    }

    #[test]
    fn test_first_fragment_wins() {
        let defaults = json!({"x": 1, "y": 2});
        let override_low = json!({"x": 100, "z": 3});
        for codec in [Codec::Json, Codec::Cbor] {
            let merged = merge_first_wins(
                codec,
                &[Fragment::value(&defaults), Fragment::value(&override_low)],
            )
            .unwrap();
            assert_eq!(as_json(codec, &merged), json!({"x": 1, "y": 2, "z": 3}));
        }
    }

    #[test]
    fn test_merge_includes_raw_fragments() {
        let raw = RawPayload::from_bytes(br#"{"_key":"k1","x":"raw"}"#.to_vec());
        let doc = json!({"x": "doc"});
        let merged =
            merge_first_wins(Codec::Json, &[Fragment::raw(&raw), Fragment::value(&doc)]).unwrap();
        assert_eq!(as_json(Codec::Json, &merged), json!({"_key": "k1", "x": "raw"}));
    }

    #[test]
    fn test_merge_rejects_non_objects() {
        let arr = json!([1, 2]);
        let obj = json!({"a": 1});
        let err = merge_first_wins(Codec::Json, &[Fragment::value(&obj), Fragment::value(&arr)])
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(msg) if msg.contains("fragment 1")));
    }

    #[test]
    fn test_overlay_is_not_recursive() {
        let base = Codec::Json
            .decode::<Value>(br#"{"a":1,"meta":{"x":1,"y":2}}"#)
            .unwrap();
        let top = Codec::Json.decode::<Value>(br#"{"meta":{"x":9}}"#).unwrap();
        let result = overlay(base, top, 0).unwrap();
        assert_eq!(
            as_json(Codec::Json, &result),
            json!({"a": 1, "meta": {"x": 9}})
        );
    }

    #[test]
    fn test_fragment_encoding_error_surfaces() {
        let mut map = std::collections::BTreeMap::new();
        map.insert((1, 2), "tuple keys are not representable in JSON");
        let fragment = Fragment::value(&map);
        assert!(matches!(fragment.encode(Codec::Json), Err(Error::Encoding(_))));
        assert!(fragment.encode(Codec::Cbor).is_ok());
    }
}
