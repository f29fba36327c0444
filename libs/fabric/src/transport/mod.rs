use bytes::Bytes;

use crate::error::Result;

pub mod client;
pub mod listener;
pub mod local;

pub use self::client::{HttpTransport, HttpTransportBuilder};
pub use self::listener::{HttpListener, ListenerOptions};
pub use self::local::LocalTransport;

/// Transport trait for delivering one encoded payload to a remote operation
///
/// Each call is a single request/response exchange. An empty response is a
/// valid answer for operations that return nothing.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` to `namespace/operation` and return the reply payload
    async fn invoke(&self, namespace: &str, operation: &str, payload: Bytes) -> Result<Bytes>;
}
