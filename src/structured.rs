//! Structured-value serializer for mesh collections
//!
//! Plain JSON cannot carry typed numeric arrays faithfully: floats go through
//! decimal text and the element type is lost. Typed arrays here serialize as
//! `{"$typed": "<Kind>", "data": "<base64 little-endian bytes>"}`, which keeps
//! both the element type and the exact bit patterns. Plain numeric JSON arrays
//! are also accepted on read.

use crate::error::Result;
use crate::utils::{bytes_to_f32, bytes_to_u32, decode_base64, encode_base64, f32_to_bytes, u32_to_bytes};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Element kind tag of an encoded typed array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypedKind {
    Float32Array,
    Uint32Array,
    Uint8Array,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EncodedArray {
    #[serde(rename = "$typed")]
    kind: TypedKind,
    data: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArrayRepr<T> {
    Encoded(EncodedArray),
    Plain(Vec<T>),
}

macro_rules! typed_array {
    ($name:ident, $elem:ty, $kind:ident, $to_bytes:expr, $from_bytes:expr) => {
        #[doc = concat!("`", stringify!($elem), "` array serialized as a `", stringify!($kind), "`")]
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name(pub Vec<$elem>);

        impl $name {
            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn as_slice(&self) -> &[$elem] {
                &self.0
            }
        }

        impl From<Vec<$elem>> for $name {
            fn from(values: Vec<$elem>) -> Self {
                Self(values)
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                let to_bytes: fn(&[$elem]) -> Vec<u8> = $to_bytes;
                EncodedArray {
                    kind: TypedKind::$kind,
                    data: encode_base64(&to_bytes(&self.0)),
                }
                .serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                use serde::de::Error;
                match ArrayRepr::<$elem>::deserialize(deserializer)? {
                    ArrayRepr::Plain(values) => Ok(Self(values)),
                    ArrayRepr::Encoded(encoded) => {
                        if encoded.kind != TypedKind::$kind {
                            return Err(D::Error::custom(format!(
                                "expected {:?}, found {:?}",
                                TypedKind::$kind,
                                encoded.kind
                            )));
                        }
                        let from_bytes: fn(Vec<u8>) -> Result<Vec<$elem>> = $from_bytes;
                        decode_base64(&encoded.data)
                            .and_then(from_bytes)
                            .map(Self)
                            .map_err(D::Error::custom)
                    }
                }
            }
        }
    };
}

typed_array!(Float32Array, f32, Float32Array, f32_to_bytes, |b| bytes_to_f32(&b));
typed_array!(Uint32Array, u32, Uint32Array, u32_to_bytes, |b| bytes_to_u32(&b));
typed_array!(Uint8Array, u8, Uint8Array, |b| b.to_vec(), Ok);

/// Serialize a value (typically a mesh collection) into a single string
pub fn to_structured_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Parse a string produced by [`to_structured_string`] into a generic value
pub fn from_structured_str(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}
