//! Customers example service on the courier substrate
//!
//! The service logic in [`service`] only knows the [`Inbound`] and
//! [`Outbound`] capabilities. [`adapter`] binds them to the wire, and
//! [`memory`] offers an in-process outbound for running without a peer.

pub mod adapter;
pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod service;

pub use error::{Error, Result};
pub use models::{Address, Customer, GetCustomerArgs};
pub use service::{CustomerService, Inbound, Outbound};
