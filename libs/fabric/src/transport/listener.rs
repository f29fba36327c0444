use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tokio::time::Instant;

use courier_core::config::DEFAULT_MAX_BODY_SIZE;
use courier_core::{ListenConfig, OperationKey, TransportFlags};

use crate::error::{Error, Result};
use crate::handlers::Handlers;

/// Pause before accepting again after a listener-level accept failure
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// How the listener routes and bounds each request
#[derive(Debug, Clone)]
pub struct ListenerOptions {
    path_prefix: String,
    request_timeout: Option<Duration>,
    max_body_size: usize,
    content_type: Option<&'static str>,
    http2: bool,
    wiretap: bool,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self {
            path_prefix: String::new(),
            request_timeout: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            content_type: None,
            http2: false,
            wiretap: false,
        }
    }
}

impl ListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(listen: &ListenConfig, flags: &TransportFlags) -> Self {
        Self {
            path_prefix: listen.path_prefix.clone(),
            request_timeout: listen.request_timeout,
            max_body_size: listen.max_body_size,
            content_type: None,
            http2: flags.http2,
            wiretap: flags.wiretap,
        }
    }

    /// Only route paths under `prefix`, e.g. `/inbound`
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Answer with a server error if a request is not done within `timeout`
    ///
    /// The deadline starts once the request head is routed and covers both
    /// reading the body and running the handler.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Reject request bodies larger than `limit` bytes
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Tag successful responses with this `Content-Type`
    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Accept HTTP/2 with prior knowledge only
    pub fn http2(mut self, enabled: bool) -> Self {
        self.http2 = enabled;
        self
    }

    /// Trace request and response payloads
    pub fn wiretap(mut self, enabled: bool) -> Self {
        self.wiretap = enabled;
        self
    }
}

/// HTTP listener that routes `POST /<namespace>/<operation>` to handlers
///
/// Every connection is served on its own task and every handler call runs
/// on its own task, so a slow handler never holds up the accept loop or
/// other requests.
pub struct HttpListener {
    listener: TcpListener,
    router: Arc<Router>,
    http2: bool,
}

impl HttpListener {
    /// Bind to `host:port`
    ///
    /// # Errors
    /// Returns [`Error::Bind`] if the address cannot be bound.
    pub async fn bind(
        host: &str,
        port: u16,
        handlers: Handlers,
        options: ListenerOptions,
    ) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| Error::bind(format!("{host}:{port}"), e))?;

        let router = Router {
            handlers,
            path_prefix: options.path_prefix,
            request_timeout: options.request_timeout,
            max_body_size: options.max_body_size,
            content_type: options.content_type,
            wiretap: options.wiretap,
        };

        let http2 = options.http2;
        let listener = Self {
            listener,
            router: Arc::new(router),
            http2,
        };
        tracing::info!(addr = %listener.local_addr()?, http2, "listening");
        Ok(listener)
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Serve until the process exits
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves
    ///
    /// Stops accepting new connections once the signal fires. Connections
    /// already accepted run to completion on their own tasks.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(connection) => connection,
                    Err(err) => {
                        match accept_backoff(&err) {
                            Some(pause) => {
                                tracing::warn!(error = %err, ?pause, "failed to accept connection");
                                tokio::time::sleep(pause).await;
                            }
                            None => tracing::debug!(error = %err, "connection dropped before accept"),
                        }
                        continue;
                    }
                },
                () = &mut signal => {
                    tracing::info!("listener shutting down");
                    return Ok(());
                }
            };

            let router = Arc::clone(&self.router);
            let mut builder = auto::Builder::new(TokioExecutor::new());
            if self.http2 {
                builder = builder.http2_only();
            }

            tokio::spawn(async move {
                let service = service_fn(move |request| Arc::clone(&router).route(request));
                if let Err(err) = builder
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    tracing::debug!(%peer, error = %err, "connection ended with error");
                }
            });
        }
    }
}

struct Router {
    handlers: Handlers,
    path_prefix: String,
    request_timeout: Option<Duration>,
    max_body_size: usize,
    content_type: Option<&'static str>,
    wiretap: bool,
}

impl Router {
    async fn route(
        self: Arc<Self>,
        request: Request<Incoming>,
    ) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
        Ok(self.dispatch(request).await)
    }

    fn key_for(&self, path: &str) -> Option<OperationKey> {
        let rest = path.strip_prefix(self.path_prefix.as_str())?;
        OperationKey::from_path(rest)
    }

    async fn dispatch(&self, request: Request<Incoming>) -> Response<Full<Bytes>> {
        if request.method() != Method::POST {
            return plain(StatusCode::METHOD_NOT_ALLOWED, "Invalid method");
        }

        let path = request.uri().path();
        let Some((key, handler)) = self
            .key_for(path)
            .and_then(|key| self.handlers.get(&key).map(|handler| (key, handler)))
        else {
            tracing::debug!(%path, "no handler for path");
            return plain(StatusCode::NOT_FOUND, "Not Found");
        };

        let deadline = self.request_timeout.map(|timeout| Instant::now() + timeout);

        let body = Limited::new(request.into_body(), self.max_body_size);
        let Some(collected) = within(deadline, body.collect()).await else {
            tracing::warn!(%key, "request body not received in time");
            return plain(StatusCode::SERVICE_UNAVAILABLE, "Request timed out");
        };
        let body = match collected {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.is::<LengthLimitError>() => {
                return plain(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Request body exceeds {} bytes", self.max_body_size),
                );
            }
            Err(err) => {
                return plain(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read request body: {err}"),
                );
            }
        };

        if self.wiretap {
            tracing::trace!(%key, len = body.len(), payload = ?body, "inbound request");
        }
        tracing::debug!(%key, len = body.len(), "dispatching");

        // The handler is called inside the task so a panic while building
        // its future is caught there too.
        let task = tokio::spawn(async move { handler(body).await });
        let Some(outcome) = within(deadline, task).await else {
            tracing::warn!(%key, timeout = ?self.request_timeout, "handler timed out");
            return plain(StatusCode::SERVICE_UNAVAILABLE, "Handler timed out");
        };

        match outcome {
            Ok(Ok(payload)) => {
                if self.wiretap {
                    tracing::trace!(%key, len = payload.len(), payload = ?payload, "inbound response");
                }
                let mut response = Response::new(Full::new(payload));
                if let Some(content_type) = self.content_type {
                    response
                        .headers_mut()
                        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                }
                response
            }
            Ok(Err(err)) => {
                tracing::warn!(%key, error = %err, "handler failed");
                plain(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "handler task aborted");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Handler panicked")
            }
        }
    }
}

/// Run `future` to completion, or give up once `deadline` passes
async fn within<F: Future>(deadline: Option<Instant>, future: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}

/// How long to pause after a failed `accept`
///
/// Errors that only concern the connection being accepted are skipped
/// straight away. Anything else (such as running out of file descriptors)
/// fails again on the next call, so the loop backs off.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset => None,
        _ => Some(ACCEPT_ERROR_BACKOFF),
    }
}

fn plain(status: StatusCode, message: impl Into<String>) -> Response<Full<Bytes>> {
    let message: String = message.into();
    let mut response = Response::new(Full::new(Bytes::from(message)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_connections_are_skipped_without_pause() {
        for kind in [
            io::ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::ConnectionReset,
        ] {
            assert_eq!(accept_backoff(&io::Error::from(kind)), None);
        }
    }

    #[cfg(unix)]
    #[test]
    fn descriptor_exhaustion_backs_off() {
        // EMFILE and ENFILE
        for code in [24, 23] {
            let err = io::Error::from_raw_os_error(code);
            assert_eq!(accept_backoff(&err), Some(ACCEPT_ERROR_BACKOFF));
        }
    }

    #[tokio::test]
    async fn within_gives_up_at_deadline() {
        let deadline = Some(Instant::now() + Duration::from_millis(20));
        assert_eq!(within(deadline, std::future::pending::<()>()).await, None);
        assert_eq!(within(None, async { 5 }).await, Some(5));
    }
}
