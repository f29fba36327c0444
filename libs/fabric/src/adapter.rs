use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use courier_core::Config;

use crate::codec::{Codec, MsgPackCodec};
use crate::error::Result;
use crate::handlers::{typed_handler, Handlers};
use crate::invoker::Invoker;
use crate::transport::{HttpListener, HttpTransportBuilder, ListenerOptions, Transport};

/// Composition root wiring codec, invoker, dispatch table and listener
///
/// Construction resolves the whole configuration up front, so a bad URL or
/// an unsupported flag fails here rather than on the first call.
pub struct Adapter<C = MsgPackCodec> {
    config: Config,
    codec: C,
    invoker: Invoker<C>,
    handlers: Handlers,
}

impl Adapter<MsgPackCodec> {
    /// Adapter speaking MessagePack to the configured remote
    ///
    /// # Errors
    /// Returns [`crate::Error::Configuration`] for an invalid configuration.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_codec(config, MsgPackCodec)
    }
}

impl<C> Adapter<C>
where
    C: Codec + Clone + 'static,
{
    /// Adapter using `codec` and an HTTP transport to the configured remote
    ///
    /// # Errors
    /// Returns [`crate::Error::Configuration`] for an invalid configuration.
    pub fn with_codec(config: Config, codec: C) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransportBuilder::from_config(&config.remote, &config.transport)
            .content_type(codec.content_type())
            .build()?;
        Self::with_transport(config, codec, Arc::new(transport))
    }

    /// Adapter whose outbound calls go through `transport`
    ///
    /// # Errors
    /// Returns [`crate::Error::Configuration`] for an invalid configuration.
    pub fn with_transport(config: Config, codec: C, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let invoker = Invoker::new(transport, codec.clone());
        Ok(Self {
            config,
            codec,
            invoker,
            handlers: Handlers::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Invoker for outbound calls, to be wrapped by an outbound capability
    pub fn invoker(&self) -> Invoker<C> {
        self.invoker.clone()
    }

    /// Dispatch table inbound operations are registered into
    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    /// Expose a typed async operation as `namespace/operation`
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidKey`] when either part of the key is empty.
    pub fn register<Req, Res, E, F, Fut>(&self, namespace: &str, operation: &str, op: F) -> Result<()>
    where
        Req: DeserializeOwned,
        Res: Serialize,
        E: std::fmt::Display,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Res, E>> + Send + 'static,
    {
        let handler = typed_handler(self.codec.clone(), op);
        self.handlers.register(namespace, operation, Some(handler))
    }

    /// Bind the listener on the configured host and port
    ///
    /// # Errors
    /// Returns [`crate::Error::Bind`] if the address cannot be bound.
    pub async fn bind(&self) -> Result<HttpListener> {
        let listen = &self.config.listen;
        let options = ListenerOptions::from_config(listen, &self.config.transport)
            .content_type(self.codec.content_type());
        tracing::info!(operations = self.handlers.len(), "binding inbound listener");
        HttpListener::bind(&listen.host, listen.port, self.handlers.clone(), options).await
    }

    /// Bind and serve until Ctrl-C
    ///
    /// # Errors
    /// Returns [`crate::Error::Bind`] if the address cannot be bound.
    pub async fn start(self) -> Result<()> {
        self.start_with_shutdown(shutdown_signal()).await
    }

    /// Bind and serve until `signal` resolves
    ///
    /// # Errors
    /// Returns [`crate::Error::Bind`] if the address cannot be bound.
    pub async fn start_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = self.bind().await?;
        listener.serve_with_shutdown(signal).await
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "unable to listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
}
