use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tote_catalog::Product;
use tote_core::{CourierId, Customer, CustomerId, OrderId, ProductId};

/// Requested quantity of a product, as supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self { product_id, quantity }
    }
}

/// A product inside an order, priced as it was when the order was placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: Product,
    pub quantity: u32,
}

impl OrderItem {
    pub fn subtotal(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// A placed order.
///
/// Everything is fixed at creation except the courier assignment, which
/// dispatch fills in later. `customer` is the customer as they were when the
/// order was placed, so discounts are priced from that snapshot; later
/// changes in the directory (such as VIP status) do not reprice the order.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    courier: RwLock<Option<CourierId>>,
}

impl Order {
    pub fn new(id: OrderId, customer: Customer, items: Vec<OrderItem>) -> Self {
        Self {
            id,
            customer,
            items,
            created_at: Utc::now(),
            courier: RwLock::new(None),
        }
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer.id
    }

    /// List-price total; computed on every call so it can never go stale
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    pub fn courier(&self) -> Option<CourierId> {
        *self.courier.read()
    }

    pub fn assign_courier(&self, courier: CourierId) {
        *self.courier.write() = Some(courier);
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            customer_id: self.customer.id,
            customer_name: self.customer.name.clone(),
            items: self.items.clone(),
            total: self.total(),
            courier_id: self.courier(),
            created_at: self.created_at,
        }
    }
}

/// Serializable view of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub courier_id: Option<CourierId>,
    pub created_at: DateTime<Utc>,
}
