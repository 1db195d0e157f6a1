//! Raw passthrough payloads.
//!
//! A [`RawPayload`] holds bytes that are already encoded in the connection's
//! wire format. Marshalling returns those bytes untouched and unmarshalling
//! copies the presented bytes in, so nothing is encoded or decoded twice.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::codec::Codec;
use crate::error::{Error, Result};

/// An already encoded value.
///
/// An empty payload stands for "no value" and marshals as the encoding's
/// null literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawPayload {
    bytes: Vec<u8>,
}

impl RawPayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap bytes that are already encoded.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The stored bytes (empty when unset).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True when no value is stored.
    pub fn is_null(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the payload, returning the stored bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encoded form under `codec`: the stored bytes verbatim, or the codec's
    /// null literal when empty. Never fails.
    pub fn marshal(&self, codec: Codec) -> &[u8] {
        if self.bytes.is_empty() {
            codec.null_literal()
        } else {
            &self.bytes
        }
    }

    /// Replace the contents of `target` with a copy of `data`.
    ///
    /// Identical for both encodings. Fails with [`Error::InvalidTarget`] when
    /// there is no receiver.
    pub fn unmarshal(target: Option<&mut RawPayload>, data: &[u8]) -> Result<()> {
        let target = target.ok_or(Error::InvalidTarget("RawPayload: unmarshal into absent receiver"))?;
        target.replace(data);
        Ok(())
    }

    /// Replace the contents with a copy of `data`.
    pub fn replace(&mut self, data: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(data);
    }
}

impl From<Vec<u8>> for RawPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for RawPayload {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl AsRef<[u8]> for RawPayload {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// Embedded in a larger value. Text serializers splice the JSON verbatim.
// Binary serializers re-emit the payload through a CBOR value, which is only
// byte-exact for canonical (shortest-form, definite-length) input, so any
// other input is rejected. Deserializing always yields the canonical form.
impl Serialize for RawPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            let text = std::str::from_utf8(self.marshal(Codec::Json)).map_err(S::Error::custom)?;
            let raw = RawValue::from_string(text.to_owned()).map_err(S::Error::custom)?;
            raw.serialize(serializer)
        } else {
            let exact = self.marshal(Codec::Cbor);
            let value: ciborium::Value = Codec::Cbor.decode(exact).map_err(S::Error::custom)?;
            let canonical = Codec::Cbor.encode(&value).map_err(S::Error::custom)?;
            if canonical != exact {
                return Err(S::Error::custom(
                    "raw payload is not canonical CBOR and cannot be embedded byte-exact",
                ));
            }
            value.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for RawPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let raw = Box::<RawValue>::deserialize(deserializer)?;
            Ok(Self::from_bytes(raw.get().as_bytes()))
        } else {
            let value = ciborium::Value::deserialize(deserializer)?;
            let mut bytes = Vec::new();
            ciborium::into_writer(&value, &mut bytes).map_err(D::Error::custom)?;
            Ok(Self { bytes })
        }
    }
}
