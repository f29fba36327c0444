//! Courier Core - shared vocabulary for the courier RPC substrate
//!
//! Holds the operation key that every call is routed by, the process
//! configuration values, and the errors raised while building either.

pub mod config;
pub mod error;
pub mod key;

pub use config::{Config, ListenConfig, RemoteConfig, TransportFlags};
pub use error::{Error, Result};
pub use key::OperationKey;
