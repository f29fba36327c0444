use bytes::Bytes;

use crate::error::{Error, Result};
use crate::handlers::Handlers;
use crate::transport::Transport;

/// In-process transport that calls straight into a dispatch table
///
/// Lets an invoker and a set of handlers run in the same process with no
/// socket in between, which keeps service tests fast and deterministic.
#[derive(Debug, Clone, Default)]
pub struct LocalTransport {
    handlers: Handlers,
}

impl LocalTransport {
    pub fn new(handlers: Handlers) -> Self {
        Self { handlers }
    }

    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }
}

#[async_trait::async_trait]
impl Transport for LocalTransport {
    async fn invoke(&self, namespace: &str, operation: &str, payload: Bytes) -> Result<Bytes> {
        let handler = self
            .handlers
            .lookup(namespace, operation)
            .ok_or_else(|| Error::Routing {
                namespace: namespace.to_string(),
                operation: operation.to_string(),
            })?;
        handler(payload).await
    }
}
