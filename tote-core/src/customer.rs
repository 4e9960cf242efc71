use crate::ids::{CustomerId, Sequence};
use crate::{require_text, CoreError, CoreResult};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registered shopper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    /// VIP customers get the loyalty discount
    pub is_vip: bool,
    pub registered_at: DateTime<Utc>,
}

/// Registration payload; the directory assigns the identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_vip: bool,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>, email: impl Into<String>, is_vip: bool) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            is_vip,
        }
    }
}

/// In-memory customer records keyed by identifier
pub struct CustomerDirectory {
    customers: RwLock<BTreeMap<CustomerId, Customer>>,
    ids: Sequence,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self {
            customers: RwLock::new(BTreeMap::new()),
            ids: Sequence::new(),
        }
    }

    /// Register a new customer and return its freshly assigned id
    pub fn register(&self, new: NewCustomer) -> CoreResult<CustomerId> {
        require_text("customer name", &new.name)?;
        require_text("customer email", &new.email)?;

        let id: CustomerId = self.ids.next_id();
        let customer = Customer {
            id,
            name: new.name,
            email: new.email,
            is_vip: new.is_vip,
            registered_at: Utc::now(),
        };

        tracing::info!(customer_id = %id, vip = customer.is_vip, "Registered customer");
        self.customers.write().insert(id, customer);
        Ok(id)
    }

    /// Store a fully formed record, replacing whatever was kept under its id
    pub fn upsert(&self, customer: Customer) -> CustomerId {
        let id = customer.id;
        self.ids.observe(id.0);
        if self.customers.write().insert(id, customer).is_some() {
            tracing::debug!(customer_id = %id, "Overwrote existing customer record");
        }
        id
    }

    pub fn find_by_id(&self, id: CustomerId) -> CoreResult<Customer> {
        self.customers
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Customer", id))
    }

    /// Flip the VIP flag, the only mutable part of a customer
    pub fn set_vip(&self, id: CustomerId, is_vip: bool) -> CoreResult<()> {
        let mut customers = self.customers.write();
        let customer = customers
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("Customer", id))?;
        customer.is_vip = is_vip;
        Ok(())
    }

    pub fn list_all(&self) -> BTreeMap<CustomerId, Customer> {
        self.customers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.customers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.read().is_empty()
    }
}

impl Default for CustomerDirectory {
    fn default() -> Self {
        Self::new()
    }
}
