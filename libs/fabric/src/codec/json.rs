use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::Codec;
use crate::error::{Error, Result};

/// JSON codec, handy when payloads need to be read by people
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let codec = JsonCodec;
        let point: Point = codec.decode(br#"{"x":1,"z":"extra","y":2}"#).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn non_string_map_keys_cannot_be_encoded() {
        let codec = JsonCodec;
        let value: HashMap<(i32, i32), i32> = HashMap::from([((1, 2), 3)]);
        assert!(matches!(codec.encode(&value), Err(Error::Encode(_))));
    }

    #[test]
    fn truncated_input_fails_to_decode() {
        let codec = JsonCodec;
        let result: Result<Point> = codec.decode(br#"{"x":1,"#);
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
