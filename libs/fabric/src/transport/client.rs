use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use url::Url;

use courier_core::{OperationKey, RemoteConfig, TransportFlags};

use crate::error::{Error, Result, TransportError};
use crate::transport::Transport;

/// Longest slice of an error response body kept in [`TransportError::Status`]
const BODY_PREVIEW_LIMIT: usize = 256;

/// HTTP transport that POSTs payloads to `<base URL>/<namespace>/<operation>`
///
/// Connections come from a pool shared by every clone of the client, so one
/// transport should serve all outbound calls of a process.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    base: String,
    content_type: Option<&'static str>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    wiretap: bool,
}

impl HttpTransport {
    /// Build a transport for the configured remote endpoint
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if the base URL is malformed.
    pub fn new(remote: &RemoteConfig, flags: &TransportFlags) -> Result<Self> {
        HttpTransportBuilder::from_config(remote, flags).build()
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Base URL every operation path is appended to, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn target(&self, namespace: &str, operation: &str) -> Result<Uri> {
        let key = OperationKey::new(namespace, operation)?;
        let target = format!("{}{}", self.base, key.path());
        target
            .parse()
            .map_err(|e| Error::InvalidKey(format!("{key} does not form a valid URI: {e}")))
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn invoke(&self, namespace: &str, operation: &str, payload: Bytes) -> Result<Bytes> {
        let uri = self.target(namespace, operation)?;

        if self.wiretap {
            tracing::trace!(%uri, len = payload.len(), payload = ?payload, "outbound request");
        }

        let mut request = Request::post(uri.clone());
        if let Some(content_type) = self.content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        let request = request
            .body(Full::new(payload))
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let body = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.exchange(request))
                .await
                .map_err(|_| TransportError::Timeout(timeout))??,
            None => self.exchange(request).await?,
        };

        if self.wiretap {
            tracing::trace!(%uri, len = body.len(), payload = ?body, "outbound response");
        }
        Ok(body)
    }
}

impl HttpTransport {
    async fn exchange(
        &self,
        request: Request<Full<Bytes>>,
    ) -> std::result::Result<Bytes, TransportError> {
        let response = self.client.request(request).await.map_err(|e| {
            match (e.is_connect(), self.connect_timeout) {
                (true, Some(limit)) if timed_out(&e) => TransportError::Timeout(limit),
                (true, _) => TransportError::Connect(e.to_string()),
                _ => TransportError::Request(e.to_string()),
            }
        })?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
            .to_bytes();

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }
        Ok(body)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base", &self.base)
            .field("content_type", &self.content_type)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

/// Whether anything in the error's source chain is an I/O timeout
fn timed_out(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::TimedOut)
        {
            return true;
        }
        current = err.source();
    }
    false
}

fn preview(body: &[u8]) -> String {
    let end = body.len().min(BODY_PREVIEW_LIMIT);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

/// Turn a base URL into `scheme://host:port/path` with no trailing slash
fn resolve_base(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| Error::Configuration(format!("invalid base URL {raw:?}: {e}")))?;

    match url.scheme() {
        "http" => {}
        "https" => {
            return Err(Error::Configuration(format!(
                "base URL {raw:?} uses https, which this build does not support"
            )))
        }
        other => {
            return Err(Error::Configuration(format!(
                "base URL {raw:?} has unsupported scheme {other:?}"
            )))
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| Error::Configuration(format!("base URL {raw:?} has no host")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| Error::Configuration(format!("base URL {raw:?} has no port")))?;
    let path = url.path().trim_end_matches('/');

    Ok(format!("{}://{}:{}{}", url.scheme(), host, port, path))
}

/// Builder for configuring the HTTP transport
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    base_url: Option<String>,
    content_type: Option<&'static str>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_timeout: Option<Duration>,
    http2: bool,
    wiretap: bool,
}

impl HttpTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the remote endpoint and transport flags of a [`courier_core::Config`]
    pub fn from_config(remote: &RemoteConfig, flags: &TransportFlags) -> Self {
        Self {
            base_url: Some(remote.base_url.clone()),
            timeout: remote.timeout,
            connect_timeout: remote.connect_timeout,
            http2: flags.http2,
            wiretap: flags.wiretap,
            ..Self::default()
        }
    }

    /// Set the base URL operation paths are appended to
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the `Content-Type` sent with every request
    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Set the deadline for a whole call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Close pooled connections idle for longer than `timeout`
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Use HTTP/2 with prior knowledge instead of HTTP/1.1
    pub fn http2(mut self, enabled: bool) -> Self {
        self.http2 = enabled;
        self
    }

    /// Trace request and response payloads
    pub fn wiretap(mut self, enabled: bool) -> Self {
        self.wiretap = enabled;
        self
    }

    /// Resolve the base URL and build the pooled client
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if the base URL is missing or malformed.
    pub fn build(self) -> Result<HttpTransport> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::Configuration("base URL not set".to_string()))?;
        let base = resolve_base(&raw)?;

        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.set_connect_timeout(self.connect_timeout);

        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_timer(TokioTimer::new()).http2_only(self.http2);
        if let Some(idle) = self.pool_idle_timeout {
            builder.pool_idle_timeout(idle);
        }

        tracing::debug!(%base, http2 = self.http2, "built outbound HTTP transport");

        Ok(HttpTransport {
            client: builder.build(connector),
            base,
            content_type: self.content_type,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            wiretap: self.wiretap,
        })
    }
}
