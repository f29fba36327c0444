use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::models::Customer;
use crate::service::Outbound;

/// Outbound capability kept entirely in process memory
///
/// Stands in for the remote peer when the service runs without one.
#[derive(Debug, Default)]
pub struct InMemoryOutbound {
    customers: DashMap<i64, Customer>,
    created: Mutex<Vec<i64>>,
}

impl InMemoryOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids announced through `customer_created`, in order
    pub fn created(&self) -> Vec<i64> {
        self.created.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

#[async_trait]
impl Outbound for InMemoryOutbound {
    async fn save_customer(&self, customer: &Customer) -> Result<()> {
        self.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn fetch_customer(&self, id: i64) -> Result<Customer> {
        self.customers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::NotFound(id))
    }

    async fn customer_created(&self, customer: &Customer) -> Result<()> {
        self.created.lock().push(customer.id);
        Ok(())
    }
}
