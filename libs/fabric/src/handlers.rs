use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use courier_core::OperationKey;

use crate::codec::Codec;
use crate::error::{Error, Result};

/// Payload-in, payload-out function bound to one operation key
pub type Handler = Arc<dyn Fn(Bytes) -> BoxFuture<'static, Result<Bytes>> + Send + Sync>;

/// Dispatch table mapping operation keys to handlers
///
/// Cloning is cheap and every clone sees the same table. Registration is
/// expected to finish before the listener starts, but the table is safe to
/// read and write concurrently either way.
#[derive(Clone, Default)]
pub struct Handlers {
    table: Arc<DashMap<OperationKey, Handler>>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to `namespace/operation`
    ///
    /// A second registration for the same key replaces the first. Passing
    /// `None` leaves the table untouched, including any existing binding.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when either part of the key is empty.
    pub fn register(
        &self,
        namespace: impl Into<String>,
        operation: impl Into<String>,
        handler: Option<Handler>,
    ) -> Result<()> {
        let key = OperationKey::new(namespace, operation)?;
        let Some(handler) = handler else {
            tracing::debug!(%key, "ignoring registration without a handler");
            return Ok(());
        };
        if self.table.insert(key.clone(), handler).is_some() {
            tracing::debug!(%key, "replaced existing handler");
        }
        Ok(())
    }

    /// Bind an async closure to `namespace/operation`
    pub fn register_fn<F, Fut>(
        &self,
        namespace: impl Into<String>,
        operation: impl Into<String>,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |input: Bytes| handler(input).boxed());
        self.register(namespace, operation, Some(handler))
    }

    pub fn lookup(&self, namespace: &str, operation: &str) -> Option<Handler> {
        let key = OperationKey::new(namespace, operation).ok()?;
        self.get(&key)
    }

    pub fn get(&self, key: &OperationKey) -> Option<Handler> {
        self.table.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> Vec<OperationKey> {
        let mut keys: Vec<_> = self.table.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Wrap a typed async operation as a [`Handler`]
///
/// The incoming payload is decoded into `Req`, the operation runs, and its
/// `Res` is encoded as the response payload. Operation failures surface as
/// [`Error::Handler`].
pub fn typed_handler<C, Req, Res, E, F, Fut>(codec: C, operation: F) -> Handler
where
    C: Codec + Clone + 'static,
    Req: DeserializeOwned,
    Res: Serialize,
    E: std::fmt::Display,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<Res, E>> + Send + 'static,
{
    Arc::new(move |input: Bytes| {
        let request: Req = match codec.decode(&input) {
            Ok(request) => request,
            Err(err) => return future::ready(Err(err)).boxed(),
        };
        let pending = operation(request);
        let codec = codec.clone();
        async move {
            let response = pending
                .await
                .map_err(|e| Error::handler(e.to_string()))?;
            codec.encode(&response)
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgPackCodec;

    fn constant(reply: &'static str) -> Handler {
        Arc::new(move |_input: Bytes| {
            future::ready(Ok::<_, Error>(Bytes::from_static(reply.as_bytes()))).boxed()
        })
    }

    async fn call(handlers: &Handlers, namespace: &str, operation: &str) -> Bytes {
        let handler = handlers.lookup(namespace, operation).unwrap();
        handler(Bytes::new()).await.unwrap()
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let handlers = Handlers::new();
        handlers.register("ns", "op", Some(constant("first"))).unwrap();
        handlers.register("ns", "op", Some(constant("second"))).unwrap();

        assert_eq!(handlers.len(), 1);
        assert_eq!(call(&handlers, "ns", "op").await, "second");
    }

    #[tokio::test]
    async fn absent_handler_keeps_existing_binding() {
        let handlers = Handlers::new();
        handlers.register("ns", "op", Some(constant("kept"))).unwrap();
        handlers.register("ns", "op", None).unwrap();

        assert_eq!(handlers.len(), 1);
        assert_eq!(call(&handlers, "ns", "op").await, "kept");
    }

    #[test]
    fn absent_handler_does_not_create_binding() {
        let handlers = Handlers::new();
        handlers.register("ns", "op", None).unwrap();
        assert!(handlers.is_empty());
        assert!(handlers.lookup("ns", "op").is_none());
    }

    #[test]
    fn empty_key_parts_are_rejected() {
        let handlers = Handlers::new();
        let result = handlers.register("", "op", Some(constant("x")));
        assert!(matches!(result, Err(Error::InvalidKey(_))));
        assert!(handlers.lookup("", "op").is_none());
    }

    #[tokio::test]
    async fn lookup_is_exact() {
        let handlers = Handlers::new();
        handlers.register("ns", "op", Some(constant("x"))).unwrap();
        assert!(handlers.lookup("ns", "Op").is_none());
        assert!(handlers.lookup("NS", "op").is_none());
        assert!(handlers.lookup("ns", "op").is_some());
    }

    #[tokio::test]
    async fn typed_handler_decodes_and_encodes() {
        let codec = MsgPackCodec;
        let handler = typed_handler(codec, |n: u32| async move {
            Ok::<_, std::convert::Infallible>(n * 2)
        });

        let output = handler(codec.encode(&21u32).unwrap()).await.unwrap();
        let doubled: u32 = codec.decode(&output).unwrap();
        assert_eq!(doubled, 42);
    }

    #[tokio::test]
    async fn typed_handler_reports_bad_input_and_failures() {
        let codec = MsgPackCodec;
        let handler = typed_handler(codec, |n: u32| async move {
            if n == 0 {
                Err("zero is not allowed")
            } else {
                Ok(n)
            }
        });

        let bad_input = handler(codec.encode("text").unwrap()).await;
        assert!(matches!(bad_input, Err(Error::Decode(_))));

        let failed = handler(codec.encode(&0u32).unwrap()).await;
        match failed {
            Err(Error::Handler(msg)) => assert!(msg.contains("zero")),
            other => panic!("Expected handler error, got {:?}", other.map(|_| ())),
        }
    }
}
