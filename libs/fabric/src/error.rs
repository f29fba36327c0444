use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No handler registered for {namespace}/{operation}")]
    Routing {
        namespace: String,
        operation: String,
    },

    #[error("Invalid operation key: {0}")]
    InvalidKey(String),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures on the wire between invoker and remote listener
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to read body: {0}")]
    Body(String),
}

impl Error {
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    pub(crate) fn bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }

    /// True when the error came from the wire rather than from the payload
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<courier_core::Error> for Error {
    fn from(err: courier_core::Error) -> Self {
        match err {
            courier_core::Error::InvalidKey(msg) => Self::InvalidKey(msg),
            courier_core::Error::Configuration(msg) => Self::Configuration(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
