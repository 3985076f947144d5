//! Payload encoding between caller values and stored JSON.
//!
//! Uncompressed payloads are stored as plain JSON. Compressed payloads are
//! `{"$zstd": "<base64 of zstd(json bytes)>"}`; decoding recognises the tag
//! regardless of the current `compress` setting, so toggling it is safe.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use foresight_core::errors::{ForesightResult, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const COMPRESSED_TAG: &str = "$zstd";
const ZSTD_LEVEL: i32 = 3;

pub fn encode<T: Serialize>(value: &T, compress: bool) -> ForesightResult<Value> {
    if !compress {
        return Ok(serde_json::to_value(value)?);
    }
    let bytes = serde_json::to_vec(value)?;
    let compressed = zstd::encode_all(bytes.as_slice(), ZSTD_LEVEL).map_err(|e| {
        StorageError::Backend {
            backend: "zstd".to_string(),
            message: e.to_string(),
        }
    })?;
    let mut tagged = serde_json::Map::with_capacity(1);
    tagged.insert(COMPRESSED_TAG.to_string(), Value::String(STANDARD.encode(compressed)));
    Ok(Value::Object(tagged))
}

pub fn decode<T: DeserializeOwned>(key: &str, payload: Value) -> ForesightResult<T> {
    match compressed_body(&payload) {
        Some(body) => {
            let corrupt = |reason: String| StorageError::Corrupt {
                key: key.to_string(),
                reason,
            };
            let compressed = STANDARD.decode(body).map_err(|e| corrupt(e.to_string()))?;
            let bytes = zstd::decode_all(compressed.as_slice()).map_err(|e| corrupt(e.to_string()))?;
            Ok(serde_json::from_slice(&bytes)?)
        }
        None => Ok(serde_json::from_value(payload)?),
    }
}

fn compressed_body(payload: &Value) -> Option<&str> {
    let object = payload.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get(COMPRESSED_TAG)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Page {
        path: String,
        body: String,
    }

    fn page() -> Page {
        Page {
            path: "/docs".into(),
            body: "<p>hello</p>".repeat(200),
        }
    }

    #[test]
    fn plain_payload_is_readable_json() {
        let value = encode(&page(), false).unwrap();
        assert_eq!(value["path"], "/docs");
    }

    #[test]
    fn compressed_payload_shrinks_and_restores() {
        let value = encode(&page(), true).unwrap();
        let body = compressed_body(&value).unwrap();
        assert!(body.len() < page().body.len());
        assert_eq!(decode::<Page>("k", value).unwrap(), page());
    }

    #[test]
    fn corrupt_compressed_payload_is_an_error() {
        let value = serde_json::json!({ "$zstd": "not base64!!" });
        let err = decode::<Page>("k", value).unwrap_err();
        assert!(err.to_string().contains("corrupt entry for k"));
    }
}
