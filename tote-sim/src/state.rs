use std::sync::Arc;
use tote_catalog::{DiscountEngine, InventoryStore};
use tote_core::CustomerDirectory;
use tote_dispatch::{CourierPool, DeliveryDispatcher, DeliverySimulation};
use tote_order::OrderCoordinator;
use tote_store::{ActionJournal, Config};

/// Every store of one simulator run, wired together explicitly
#[derive(Clone)]
pub struct SimState {
    pub customers: Arc<CustomerDirectory>,
    pub inventory: Arc<InventoryStore>,
    pub pricing: Arc<DiscountEngine>,
    pub orders: Arc<OrderCoordinator>,
    pub couriers: Arc<CourierPool>,
    pub dispatcher: Arc<DeliveryDispatcher>,
    pub journal: Arc<ActionJournal>,
    pub config: Arc<Config>,
}

impl SimState {
    pub fn new(config: Config) -> Self {
        let inventory = Arc::new(InventoryStore::new());
        let pricing = Arc::new(DiscountEngine::from_rates(
            config.discounts.vip_rate,
            config.discounts.category_rates.clone(),
        ));
        let orders = Arc::new(OrderCoordinator::new(inventory.clone(), pricing.clone()));
        let couriers = Arc::new(CourierPool::new());
        let dispatcher = Arc::new(DeliveryDispatcher::new(couriers.clone()));

        Self {
            customers: Arc::new(CustomerDirectory::new()),
            inventory,
            pricing,
            orders,
            couriers,
            dispatcher,
            journal: Arc::new(ActionJournal::new()),
            config: Arc::new(config),
        }
    }

    pub fn simulation(&self) -> DeliverySimulation {
        DeliverySimulation::new(self.dispatcher.clone(), self.config.transit())
    }
}
