use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub mod json;
pub mod msgpack;

pub use self::json::JsonCodec;
pub use self::msgpack::MsgPackCodec;

/// Codec trait for turning typed values into payloads and back
///
/// Payloads carry no type tag: the caller names the target type when
/// decoding. Implementations must ignore fields the target type does not
/// know, and must produce identical bytes for identical input.
pub trait Codec: Send + Sync {
    /// Media type sent alongside payloads produced by this codec
    fn content_type(&self) -> &'static str;

    /// Encode a value into a payload
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes>;

    /// Decode a payload into a value
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}
