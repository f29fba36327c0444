use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::Codec;
use crate::error::Result;
use crate::handlers::Handlers;
use crate::transport::{LocalTransport, Transport};

/// Typed front end over a [`Transport`]
///
/// Encodes arguments and decodes results with `C`. Encode, decode and
/// transport failures all come back through the same [`Result`]. Calls are
/// never retried.
#[derive(Clone)]
pub struct Invoker<C> {
    transport: Arc<dyn Transport>,
    codec: C,
}

impl<C: Codec> Invoker<C> {
    pub fn new(transport: Arc<dyn Transport>, codec: C) -> Self {
        Self { transport, codec }
    }

    /// Invoker that dispatches into `handlers` in the same process
    pub fn local(handlers: Handlers, codec: C) -> Self {
        Self::new(Arc::new(LocalTransport::new(handlers)), codec)
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Call an operation and ignore whatever it answers
    pub async fn invoke<T>(&self, namespace: &str, operation: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = self.codec.encode(value)?;
        self.transport.invoke(namespace, operation, payload).await?;
        Ok(())
    }

    /// Call an operation and decode its answer as `R`
    pub async fn invoke_with_return<T, R>(
        &self,
        namespace: &str,
        operation: &str,
        value: &T,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = self.codec.encode(value)?;
        let response = self.transport.invoke(namespace, operation, payload).await?;
        self.codec.decode(&response)
    }
}

impl<C> std::fmt::Debug for Invoker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker").finish_non_exhaustive()
    }
}
