use std::time::Duration;

use crate::error::{Error, Result};

/// Default listen host
pub const DEFAULT_HOST: &str = "localhost";

/// Default listen port
pub const DEFAULT_PORT: u16 = 9000;

/// Default base URL for outbound calls
pub const DEFAULT_OUTBOUND_BASE_URL: &str = "http://localhost:32321/outbound";

/// Largest request body the listener will aggregate (100MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024 * 1024;

/// Process-wide configuration, resolved once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub listen: ListenConfig,
    pub remote: RemoteConfig,
    pub transport: TransportFlags,
}

/// Where and how the listener accepts requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix stripped before routing, e.g. `/inbound`. Empty means none.
    pub path_prefix: String,
    /// Per-request handler deadline
    pub request_timeout: Option<Duration>,
    pub max_body_size: usize,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path_prefix: String::new(),
            request_timeout: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Remote peer that outbound calls are sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Deadline for a whole call, connect through response body
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OUTBOUND_BASE_URL.to_string(),
            timeout: None,
            connect_timeout: None,
        }
    }
}

/// Transport tuning switches
///
/// None of these change how operations are addressed or dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportFlags {
    pub tls: bool,
    pub compress: bool,
    /// Speak HTTP/2 with prior knowledge on both sides
    pub http2: bool,
    /// Trace every payload that crosses the wire
    pub wiretap: bool,
}

impl Config {
    /// Check the configuration before anything is built from it
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] for settings this build cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.transport.tls {
            return Err(Error::configuration(
                "TLS was requested but is not supported by this build",
            ));
        }
        if self.transport.compress {
            return Err(Error::configuration(
                "compression was requested but is not supported by this build",
            ));
        }
        if self.listen.host.is_empty() {
            return Err(Error::configuration("listen host is empty"));
        }
        if self.listen.max_body_size == 0 {
            return Err(Error::configuration("max body size must be positive"));
        }
        let prefix = &self.listen.path_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(Error::configuration(format!(
                "path prefix {prefix:?} must start with '/' and not end with one"
            )));
        }
        if self.remote.base_url.is_empty() {
            return Err(Error::configuration("remote base URL is empty"));
        }
        Ok(())
    }
}
