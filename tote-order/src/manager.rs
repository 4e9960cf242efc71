use crate::models::{Order, OrderItem, OrderLine};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use tote_catalog::{DiscountEngine, InventoryStore, Product};
use tote_core::{CoreError, CoreResult, Customer, CustomerId, OrderId, ProductId, Sequence};

/// Validates and records orders against the shared inventory
pub struct OrderCoordinator {
    inventory: Arc<InventoryStore>,
    pricing: Arc<DiscountEngine>,
    orders: RwLock<BTreeMap<OrderId, Arc<Order>>>,
    by_customer: RwLock<BTreeMap<CustomerId, Vec<OrderId>>>,
    ids: Sequence,
    // Held from stock validation until the order is recorded
    placement: Mutex<()>,
}

impl OrderCoordinator {
    pub fn new(inventory: Arc<InventoryStore>, pricing: Arc<DiscountEngine>) -> Self {
        Self {
            inventory,
            pricing,
            orders: RwLock::new(BTreeMap::new()),
            by_customer: RwLock::new(BTreeMap::new()),
            ids: Sequence::new(),
            placement: Mutex::new(()),
        }
    }

    /// Place an order for `customer`.
    ///
    /// Every line is checked against current stock before anything is
    /// reserved: a single short line rejects the whole order and leaves all
    /// stock untouched.
    pub fn create_order(&self, customer: &Customer, lines: &[OrderLine]) -> CoreResult<Arc<Order>> {
        if lines.is_empty() {
            return Err(CoreError::invalid("an order needs at least one item"));
        }
        if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
            return Err(CoreError::invalid(format!(
                "quantity for product {} must be positive",
                line.product_id
            )));
        }

        let _placing = self.placement.lock();

        let items = self.validate_stock(lines)?;
        self.reserve_all(&items)?;

        let id: OrderId = self.ids.next_id();
        let order = Arc::new(Order::new(id, customer.clone(), items));

        self.orders.write().insert(id, order.clone());
        self.by_customer
            .write()
            .entry(customer.id)
            .or_default()
            .push(id);

        tracing::info!(
            order_id = %id,
            customer_id = %customer.id,
            items = order.items.len(),
            total = order.total(),
            "Order created"
        );
        Ok(order)
    }

    /// One pass over the lines; quantities for the same product are summed
    fn validate_stock(&self, lines: &[OrderLine]) -> CoreResult<Vec<OrderItem>> {
        let mut requested: BTreeMap<ProductId, u32> = BTreeMap::new();
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let product = self.inventory.find_by_id(line.product_id)?;
            let total = requested.entry(line.product_id).or_insert(0);
            *total = total.saturating_add(line.quantity);

            if *total > product.stock {
                tracing::warn!(
                    product_id = %product.id,
                    requested = *total,
                    available = product.stock,
                    "Order rejected, not enough stock"
                );
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    requested: *total,
                    available: product.stock,
                });
            }

            items.push(OrderItem {
                product,
                quantity: line.quantity,
            });
        }

        Ok(items)
    }

    fn reserve_all(&self, items: &[OrderItem]) -> CoreResult<()> {
        for item in items {
            if let Err(err) = self.inventory.reserve_stock(item.product.id, item.quantity) {
                // Only reachable if stock was taken outside of order placement
                tracing::error!(
                    product_id = %item.product.id,
                    error = %err,
                    "Reservation failed after validation"
                );
                return Err(CoreError::Invariant(format!(
                    "stock for product {} changed during order placement: {err}",
                    item.product.id
                )));
            }
        }
        Ok(())
    }

    pub fn find_order(&self, id: OrderId) -> CoreResult<Arc<Order>> {
        self.orders
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Order", id))
    }

    /// A customer's orders in the order they were placed
    pub fn orders_for_customer(&self, customer_id: CustomerId) -> Vec<Arc<Order>> {
        let ids = self
            .by_customer
            .read()
            .get(&customer_id)
            .cloned()
            .unwrap_or_default();
        let orders = self.orders.read();
        ids.iter().filter_map(|id| orders.get(id).cloned()).collect()
    }

    pub fn all_orders(&self) -> Vec<Arc<Order>> {
        self.orders.read().values().cloned().collect()
    }

    pub fn order_count(&self) -> usize {
        self.orders.read().len()
    }

    /// Price of the order after discounts for its customer
    pub fn quote(&self, order: &Order) -> f64 {
        order
            .items
            .iter()
            .map(|item| {
                let unit = self.discounted_unit_price(&order.customer, &item.product);
                unit * f64::from(item.quantity)
            })
            .sum()
    }

    pub fn discounted_unit_price(&self, customer: &Customer, product: &Product) -> f64 {
        self.pricing.final_price(customer, product)
    }

    pub fn total_revenue(&self) -> f64 {
        self.orders.read().values().map(|order| order.total()).sum()
    }

    pub fn mean_order_value(&self) -> f64 {
        let orders = self.orders.read();
        if orders.is_empty() {
            return 0.0;
        }
        let total: f64 = orders.values().map(|order| order.total()).sum();
        total / orders.len() as f64
    }

    /// Order with the strictly greatest total; the earliest one wins a tie
    pub fn highest_value_order(&self) -> Option<Arc<Order>> {
        let orders = self.orders.read();
        let mut highest: Option<(&Arc<Order>, f64)> = None;

        for order in orders.values() {
            let total = order.total();
            match highest {
                Some((_, best)) if total <= best => {}
                _ => highest = Some((order, total)),
            }
        }

        highest.map(|(order, _)| order.clone())
    }
}
