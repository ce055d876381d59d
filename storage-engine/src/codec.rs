use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::{Error, Result};

/// Serialize a payload into the JSON bytes handed to a backend.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Encode(e.to_string()))
}

/// Deserialize bytes read back from a backend.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn nested_values_survive() {
        let value = json!({
            "name": "a",
            "tags": ["x", "y"],
            "score": 1.5,
            "active": true,
            "parent": null,
            "nested": { "depth": [1, [2, [3]]] }
        });

        let bytes = encode(&value).unwrap();
        assert_eq!(decode::<Value>(&bytes).unwrap(), value);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode::<Value>(b"\x00not json").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
