use crate::courier::CourierPool;
use crate::models::{Delivery, DeliveryStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tote_core::{CoreError, CoreResult, OrderId};
use tote_order::Order;
use uuid::Uuid;

#[derive(Default)]
struct DeliveryLog {
    by_id: HashMap<Uuid, Delivery>,
    // creation order
    sequence: Vec<Uuid>,
    active_by_order: HashMap<OrderId, Uuid>,
}

/// Matches orders with free couriers and tracks the resulting deliveries
pub struct DeliveryDispatcher {
    couriers: Arc<CourierPool>,
    deliveries: RwLock<DeliveryLog>,
}

impl DeliveryDispatcher {
    pub fn new(couriers: Arc<CourierPool>) -> Self {
        Self {
            couriers,
            deliveries: RwLock::new(DeliveryLog::default()),
        }
    }

    pub fn couriers(&self) -> &Arc<CourierPool> {
        &self.couriers
    }

    /// Claim the first free courier for `order` and open a pending delivery.
    ///
    /// When every courier is busy the order stays unassigned and
    /// `NoCourierAvailable` is returned; nothing is queued.
    pub fn assign(&self, order: &Arc<Order>) -> CoreResult<Delivery> {
        let mut log = self.deliveries.write();
        if let Some(active) = log.active_by_order.get(&order.id) {
            return Err(CoreError::invalid(format!(
                "order {} already has an active delivery {active}",
                order.id
            )));
        }

        let Some(courier) = self.couriers.claim() else {
            tracing::warn!(order_id = %order.id, "No couriers available for order");
            return Err(CoreError::NoCourierAvailable);
        };

        order.assign_courier(courier.id());
        let delivery = Delivery::new(order.clone(), courier);
        log.sequence.push(delivery.id);
        log.active_by_order.insert(order.id, delivery.id);
        log.by_id.insert(delivery.id, delivery.clone());
        drop(log);

        tracing::info!(
            delivery_id = %delivery.id,
            order_id = %order.id,
            courier_id = %delivery.courier_id(),
            "Assigned courier"
        );
        Ok(delivery)
    }

    /// Move a delivery forward in its lifecycle.
    ///
    /// Setting the current status again is a no-op; going backwards is
    /// rejected. Reaching `Delivered` hands the courier back to the pool.
    pub fn update_status(
        &self,
        delivery_id: Uuid,
        status: DeliveryStatus,
    ) -> CoreResult<Delivery> {
        let (updated, previous) = {
            let mut log = self.deliveries.write();
            let delivery = log
                .by_id
                .get_mut(&delivery_id)
                .ok_or_else(|| CoreError::not_found("Delivery", delivery_id))?;

            let previous = delivery.status;
            if previous == status {
                return Ok(delivery.clone());
            }
            if status.stage() < previous.stage() {
                return Err(CoreError::invalid(format!(
                    "delivery {delivery_id} cannot move from {previous} back to {status}"
                )));
            }

            delivery.status = status;
            delivery.updated_at = chrono::Utc::now();
            let updated = delivery.clone();
            if status.is_terminal() {
                log.active_by_order.remove(&updated.order_id());
            }
            (updated, previous)
        };

        if status == DeliveryStatus::Delivered {
            let courier_id = updated.courier_id();
            self.couriers.mark_free(courier_id).map_err(|err| {
                tracing::error!(
                    delivery_id = %delivery_id,
                    error = %err,
                    "Delivery references unknown courier"
                );
                CoreError::Invariant(format!(
                    "delivery {delivery_id} references courier {courier_id} missing from the pool"
                ))
            })?;
        }

        tracing::info!(
            delivery_id = %delivery_id,
            order_id = %updated.order.id,
            from = %previous,
            to = %status,
            "Updated delivery status"
        );
        Ok(updated)
    }

    /// String entry point for outer command surfaces
    pub fn update_status_str(&self, delivery_id: Uuid, status: &str) -> CoreResult<Delivery> {
        let status = status.parse::<DeliveryStatus>()?;
        self.update_status(delivery_id, status)
    }

    pub fn find_delivery(&self, delivery_id: Uuid) -> CoreResult<Delivery> {
        self.deliveries
            .read()
            .by_id
            .get(&delivery_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Delivery", delivery_id))
    }

    /// Every delivery in creation order
    pub fn list_deliveries(&self) -> Vec<Delivery> {
        let log = self.deliveries.read();
        log.sequence
            .iter()
            .filter_map(|id| log.by_id.get(id).cloned())
            .collect()
    }

    pub fn active_deliveries(&self) -> Vec<Delivery> {
        self.list_deliveries()
            .into_iter()
            .filter(Delivery::is_active)
            .collect()
    }

    /// Open delivery for an order, if any
    pub fn active_delivery_for(&self, order_id: OrderId) -> Option<Uuid> {
        self.deliveries.read().active_by_order.get(&order_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courier::NewCourier;
    use tote_catalog::{DiscountEngine, InventoryStore, NewProduct};
    use tote_core::{CourierId, CustomerDirectory, NewCustomer};
    use tote_order::{OrderCoordinator, OrderLine};

    struct Fixture {
        coordinator: OrderCoordinator,
        dispatcher: DeliveryDispatcher,
        pool: Arc<CourierPool>,
        directory: CustomerDirectory,
        product: tote_core::ProductId,
    }

    fn fixture(couriers: usize) -> Fixture {
        let inventory = Arc::new(InventoryStore::new());
        let product = inventory
            .add_product(NewProduct::new("Tee", "shirt", 20.0, 100))
            .unwrap();
        let pool = Arc::new(CourierPool::new());
        for i in 0..couriers {
            pool.add(NewCourier::new(format!("Courier {i}"), "bike")).unwrap();
        }
        Fixture {
            coordinator: OrderCoordinator::new(inventory, Arc::new(DiscountEngine::standard())),
            dispatcher: DeliveryDispatcher::new(pool.clone()),
            pool,
            directory: CustomerDirectory::new(),
            product,
        }
    }

    fn place(fx: &Fixture) -> Arc<Order> {
        let id = fx
            .directory
            .register(NewCustomer::new("Ada", "ada@example.com", false))
            .unwrap();
        let customer = fx.directory.find_by_id(id).unwrap();
        fx.coordinator
            .create_order(&customer, &[OrderLine::new(fx.product, 1)])
            .unwrap()
    }

    #[test]
    fn test_assign_claims_courier() {
        let fx = fixture(1);
        let order = place(&fx);

        let delivery = fx.dispatcher.assign(&order).unwrap();

        assert_eq!(delivery.status, DeliveryStatus::Pending);
        assert_eq!(delivery.courier_id(), CourierId(1));
        assert_eq!(order.courier(), Some(CourierId(1)));
        assert!(!fx.pool.find_by_id(CourierId(1)).unwrap().available);
        assert!(fx.pool.find_available().is_none());
    }

    #[test]
    fn test_assign_without_courier() {
        let fx = fixture(1);
        let first = place(&fx);
        let second = place(&fx);

        fx.dispatcher.assign(&first).unwrap();
        let result = fx.dispatcher.assign(&second);

        assert_eq!(result.unwrap_err(), CoreError::NoCourierAvailable);
        assert_eq!(second.courier(), None);
        assert_eq!(fx.dispatcher.list_deliveries().len(), 1);
    }

    #[test]
    fn test_delivered_releases_courier_once() {
        let fx = fixture(1);
        let order = place(&fx);
        let delivery = fx.dispatcher.assign(&order).unwrap();

        fx.dispatcher
            .update_status(delivery.id, DeliveryStatus::InTransit)
            .unwrap();
        assert!(fx.pool.find_available().is_none());

        let done = fx
            .dispatcher
            .update_status(delivery.id, DeliveryStatus::Delivered)
            .unwrap();
        assert_eq!(done.status, DeliveryStatus::Delivered);
        assert!(fx.pool.find_by_id(CourierId(1)).unwrap().available);

        // Someone else takes the courier; repeating Delivered must not free it again
        let next = place(&fx);
        fx.dispatcher.assign(&next).unwrap();
        fx.dispatcher
            .update_status(delivery.id, DeliveryStatus::Delivered)
            .unwrap();
        assert!(!fx.pool.find_by_id(CourierId(1)).unwrap().available);
    }

    #[test]
    fn test_backwards_transition_rejected() {
        let fx = fixture(1);
        let order = place(&fx);
        let delivery = fx.dispatcher.assign(&order).unwrap();

        fx.dispatcher
            .update_status(delivery.id, DeliveryStatus::Delivered)
            .unwrap();
        let result = fx.dispatcher.update_status(delivery.id, DeliveryStatus::Pending);

        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert_eq!(
            fx.dispatcher.find_delivery(delivery.id).unwrap().status,
            DeliveryStatus::Delivered
        );
    }

    #[test]
    fn test_update_status_from_text() {
        let fx = fixture(1);
        let order = place(&fx);
        let delivery = fx.dispatcher.assign(&order).unwrap();

        assert!(matches!(
            fx.dispatcher.update_status_str(delivery.id, "  "),
            Err(CoreError::InvalidInput(_))
        ));
        let updated = fx.dispatcher.update_status_str(delivery.id, "in transit").unwrap();
        assert_eq!(updated.status, DeliveryStatus::InTransit);
    }

    #[test]
    fn test_unknown_delivery() {
        let fx = fixture(1);
        let result = fx.dispatcher.update_status(Uuid::new_v4(), DeliveryStatus::Delivered);
        assert!(matches!(result, Err(CoreError::NotFound { entity: "Delivery", .. })));
    }

    #[test]
    fn test_order_cannot_be_assigned_twice_while_active() {
        let fx = fixture(2);
        let order = place(&fx);

        let delivery = fx.dispatcher.assign(&order).unwrap();
        assert!(matches!(fx.dispatcher.assign(&order), Err(CoreError::InvalidInput(_))));
        assert_eq!(fx.pool.list_available().len(), 1);
        assert_eq!(fx.dispatcher.active_delivery_for(order.id), Some(delivery.id));

        fx.dispatcher
            .update_status(delivery.id, DeliveryStatus::Delivered)
            .unwrap();
        assert!(fx.dispatcher.active_deliveries().is_empty());
        assert_eq!(fx.dispatcher.active_delivery_for(order.id), None);
    }

    #[test]
    fn test_concurrent_assign_of_same_order() {
        let fx = fixture(8);
        let order = place(&fx);
        let dispatcher = Arc::new(fx.dispatcher);
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                let order = order.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    dispatcher.assign(&order).is_ok()
                })
            })
            .collect();
        let assigned = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(assigned, 1);
        assert_eq!(dispatcher.list_deliveries().len(), 1);
        assert_eq!(fx.pool.list_available().len(), 7);
    }

    #[test]
    fn test_delivered_record_shows_courier_free() {
        let fx = fixture(1);
        let order = place(&fx);
        let delivery = fx.dispatcher.assign(&order).unwrap();
        assert!(!delivery.record().courier.available);

        let done = fx
            .dispatcher
            .update_status(delivery.id, DeliveryStatus::Delivered)
            .unwrap();

        assert!(done.record().courier.available);
        assert!(delivery.record().courier.available);
        assert_eq!(done.record().courier, fx.pool.find_by_id(CourierId(1)).unwrap());
    }

    #[test]
    fn test_delivery_line_mentions_order_and_courier() {
        let fx = fixture(1);
        let order = place(&fx);
        let delivery = fx.dispatcher.assign(&order).unwrap();

        let line = delivery.to_string();
        assert!(line.contains(&format!("order #{}", order.id)));
        assert!(line.contains("Courier 0"));
        assert!(line.contains("Pending"));
    }
}
