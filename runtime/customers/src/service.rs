use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Customer;

/// Operations this service exposes to callers
#[async_trait]
pub trait Inbound: Send + Sync {
    /// Creates a new customer
    async fn create_customer(&self, _customer: Customer) -> Result<Customer> {
        Err(Error::NotImplemented("createCustomer"))
    }

    /// Retrieve a customer by id
    async fn get_customer(&self, _id: i64) -> Result<Customer> {
        Err(Error::NotImplemented("getCustomer"))
    }
}

/// Operations this service calls on its peer
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn save_customer(&self, customer: &Customer) -> Result<()>;

    async fn fetch_customer(&self, id: i64) -> Result<Customer>;

    async fn customer_created(&self, customer: &Customer) -> Result<()>;
}

/// Customer service logic, written only against [`Outbound`]
pub struct CustomerService {
    outbound: Arc<dyn Outbound>,
}

impl CustomerService {
    pub fn new(outbound: Arc<dyn Outbound>) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl Inbound for CustomerService {
    async fn create_customer(&self, customer: Customer) -> Result<Customer> {
        self.outbound.save_customer(&customer).await?;
        self.outbound.customer_created(&customer).await?;
        tracing::info!(id = customer.id, "customer created");
        Ok(customer)
    }

    async fn get_customer(&self, id: i64) -> Result<Customer> {
        self.outbound.fetch_customer(id).await
    }
}
