use std::time::Duration;

use clap::Parser;
use courier_core::config::{
    DEFAULT_HOST, DEFAULT_MAX_BODY_SIZE, DEFAULT_OUTBOUND_BASE_URL, DEFAULT_PORT,
};
use courier_core::{Config, ListenConfig, RemoteConfig, TransportFlags};

/// Customers example service
#[derive(Debug, Parser)]
#[command(name = "customers", version, about)]
pub struct Cli {
    /// Host to listen on
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path prefix in front of inbound operation paths, e.g. /inbound
    #[arg(long, env = "INBOUND_PATH_PREFIX", default_value = "")]
    pub path_prefix: String,

    /// Base URL of the peer serving outbound operations
    #[arg(long, env = "OUTBOUND_BASE_URL", default_value = DEFAULT_OUTBOUND_BASE_URL)]
    pub outbound_base_url: String,

    /// Per-request handler deadline in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Outbound call deadline in milliseconds
    #[arg(long, env = "OUTBOUND_TIMEOUT_MS")]
    pub outbound_timeout_ms: Option<u64>,

    /// Outbound connect deadline in milliseconds
    #[arg(long, env = "CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: Option<u64>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_SIZE", default_value_t = DEFAULT_MAX_BODY_SIZE)]
    pub max_body_size: usize,

    /// Serve and call over TLS
    #[arg(long, env = "SECURE")]
    pub secure: bool,

    /// Compress payloads
    #[arg(long, env = "COMPRESS")]
    pub compress: bool,

    /// Use HTTP/2 with prior knowledge
    #[arg(long, env = "HTTP2")]
    pub http2: bool,

    /// Trace every payload on the wire
    #[arg(long, env = "WIRETAP")]
    pub wiretap: bool,
}

impl Cli {
    pub fn into_config(self) -> Config {
        Config {
            listen: ListenConfig {
                host: self.host,
                port: self.port,
                path_prefix: self.path_prefix,
                request_timeout: self.request_timeout_ms.map(Duration::from_millis),
                max_body_size: self.max_body_size,
            },
            remote: RemoteConfig {
                base_url: self.outbound_base_url,
                timeout: self.outbound_timeout_ms.map(Duration::from_millis),
                connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            },
            transport: TransportFlags {
                tls: self.secure,
                compress: self.compress,
                http2: self.http2,
                wiretap: self.wiretap,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let config = Cli::parse_from([
            "customers",
            "--host",
            "0.0.0.0",
            "--port",
            "8000",
            "--outbound-base-url",
            "http://peer:9000/outbound/",
            "--request-timeout-ms",
            "250",
            "--http2",
            "--wiretap",
        ])
        .into_config();

        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.listen.port, 8000);
        assert_eq!(config.listen.request_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.remote.base_url, "http://peer:9000/outbound/");
        assert!(config.transport.http2);
        assert!(config.transport.wiretap);
        assert!(!config.transport.tls);
    }
}
