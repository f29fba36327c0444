//! Binds the customer capabilities to the courier substrate
//!
//! Outbound calls go through an [`Invoker`]; inbound operations are
//! registered into the adapter's dispatch table under
//! [`INBOUND_NAMESPACE`].

use std::sync::Arc;

use async_trait::async_trait;
use courier_fabric::codec::Codec;
use courier_fabric::{Adapter, Invoker};

use crate::error::Result;
use crate::models::{Customer, GetCustomerArgs};
use crate::service::{Inbound, Outbound};

pub const INBOUND_NAMESPACE: &str = "customers.v1.Inbound";
pub const OUTBOUND_NAMESPACE: &str = "customers.v1.Outbound";

/// [`Outbound`] backed by remote calls
#[derive(Debug, Clone)]
pub struct RemoteOutbound<C> {
    invoker: Invoker<C>,
}

impl<C: Codec> RemoteOutbound<C> {
    pub fn new(invoker: Invoker<C>) -> Self {
        Self { invoker }
    }
}

#[async_trait]
impl<C> Outbound for RemoteOutbound<C>
where
    C: Codec + Clone + 'static,
{
    async fn save_customer(&self, customer: &Customer) -> Result<()> {
        self.invoker
            .invoke(OUTBOUND_NAMESPACE, "saveCustomer", customer)
            .await?;
        Ok(())
    }

    async fn fetch_customer(&self, id: i64) -> Result<Customer> {
        let args = GetCustomerArgs { id };
        let customer = self
            .invoker
            .invoke_with_return(OUTBOUND_NAMESPACE, "fetchCustomer", &args)
            .await?;
        Ok(customer)
    }

    async fn customer_created(&self, customer: &Customer) -> Result<()> {
        self.invoker
            .invoke(OUTBOUND_NAMESPACE, "customerCreated", customer)
            .await?;
        Ok(())
    }
}

/// Outbound capability wired to the adapter's remote peer
pub fn new_outbound<C>(adapter: &Adapter<C>) -> RemoteOutbound<C>
where
    C: Codec + Clone + 'static,
{
    RemoteOutbound::new(adapter.invoker())
}

/// Expose `inbound` as `customers.v1.Inbound/{createCustomer,getCustomer}`
pub fn register_inbound<C>(
    adapter: &Adapter<C>,
    inbound: Arc<dyn Inbound>,
) -> courier_fabric::Result<()>
where
    C: Codec + Clone + 'static,
{
    let service = Arc::clone(&inbound);
    adapter.register(
        INBOUND_NAMESPACE,
        "createCustomer",
        move |customer: Customer| {
            let service = Arc::clone(&service);
            async move { service.create_customer(customer).await }
        },
    )?;

    let service = inbound;
    adapter.register(
        INBOUND_NAMESPACE,
        "getCustomer",
        move |args: GetCustomerArgs| {
            let service = Arc::clone(&service);
            async move { service.get_customer(args.id).await }
        },
    )?;

    Ok(())
}

/// Expose `outbound` as `customers.v1.Outbound/*`
///
/// This is the peer side of [`RemoteOutbound`], used when one process plays
/// the remote for another.
pub fn register_outbound<C>(
    adapter: &Adapter<C>,
    outbound: Arc<dyn Outbound>,
) -> courier_fabric::Result<()>
where
    C: Codec + Clone + 'static,
{
    let peer = Arc::clone(&outbound);
    adapter.register(
        OUTBOUND_NAMESPACE,
        "saveCustomer",
        move |customer: Customer| {
            let peer = Arc::clone(&peer);
            async move { peer.save_customer(&customer).await }
        },
    )?;

    let peer = Arc::clone(&outbound);
    adapter.register(
        OUTBOUND_NAMESPACE,
        "fetchCustomer",
        move |args: GetCustomerArgs| {
            let peer = Arc::clone(&peer);
            async move { peer.fetch_customer(args.id).await }
        },
    )?;

    let peer = outbound;
    adapter.register(
        OUTBOUND_NAMESPACE,
        "customerCreated",
        move |customer: Customer| {
            let peer = Arc::clone(&peer);
            async move { peer.customer_created(&customer).await }
        },
    )?;

    Ok(())
}
