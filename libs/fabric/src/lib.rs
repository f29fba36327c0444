//! Courier Fabric - RPC substrate addressed by namespace and operation
//!
//! Provides codecs (MessagePack, JSON), a dispatch table of payload
//! handlers, an HTTP listener that routes `POST /<namespace>/<operation>`
//! into that table, an HTTP transport for the calling side, and a typed
//! [`Invoker`] on top of any transport.
//!
//! # Example
//!
//! ```no_run
//! use courier_fabric::{Adapter, Config};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Greet { name: String }
//!
//! #[derive(Serialize, Deserialize)]
//! struct Greeting { text: String }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let adapter = Adapter::new(Config::default())?;
//!
//! // Expose an operation
//! adapter.register("greeter.v1", "greet", |req: Greet| async move {
//!     Ok::<_, std::convert::Infallible>(Greeting { text: format!("hello {}", req.name) })
//! })?;
//!
//! // Call one on the remote peer
//! let invoker = adapter.invoker();
//! let reply: Greeting = invoker
//!     .invoke_with_return("greeter.v1", "greet", &Greet { name: "ada".into() })
//!     .await?;
//!
//! adapter.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod codec;
pub mod error;
pub mod handlers;
pub mod invoker;
pub mod transport;

// Re-exports for convenience
pub use adapter::Adapter;
pub use courier_core::{Config, ListenConfig, OperationKey, RemoteConfig, TransportFlags};
pub use error::{Error, Result, TransportError};
pub use handlers::{Handler, Handlers};
pub use invoker::Invoker;
