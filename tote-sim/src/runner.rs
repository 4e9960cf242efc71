use crate::error::SimResult;
use crate::state::SimState;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tote_core::{CoreError, OrderId};
use tote_dispatch::BatchReport;
use tote_order::{Order, OrderLine};
use tote_store::{default_report_path, ReportWriter};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub customers: usize,
    pub products: usize,
    pub couriers: usize,
}

/// Everything a caller wants to know after one simulator run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub seeded: SeedSummary,
    pub orders_placed: usize,
    pub orders_rejected: usize,
    pub batch: BatchReport,
    pub total_revenue: f64,
    pub discounted_revenue: f64,
    pub mean_order_value: f64,
    pub highest_value_order: Option<OrderId>,
    pub report_path: PathBuf,
}

impl SimState {
    /// Load the configured seed records into the stores
    pub fn seed(&self) -> SimResult<SeedSummary> {
        let seed = &self.config.seed;
        let mut summary = SeedSummary::default();

        for customer in &seed.customers {
            let id = self.customers.register(customer.clone())?;
            self.journal.record(format!("Added Customer {id}"));
            summary.customers += 1;
        }
        for product in &seed.products {
            let id = self.inventory.add_product(product.clone())?;
            self.journal.record(format!("Added Product {id}"));
            summary.products += 1;
        }
        for courier in &seed.couriers {
            let id = self.couriers.add(courier.clone())?;
            self.journal.record(format!("Added Courier {id}"));
            summary.couriers += 1;
        }

        tracing::info!(
            customers = summary.customers,
            products = summary.products,
            couriers = summary.couriers,
            "Seeded stores"
        );
        Ok(summary)
    }

    /// Place one order per requested delivery, cycling through customers
    /// and products. Rejected orders are logged and counted, not fatal.
    pub fn place_orders(&self) -> SimResult<(Vec<Arc<Order>>, usize)> {
        let customers: Vec<_> = self.customers.list_all().into_values().collect();
        let products = self.inventory.list_all();
        let wanted = self.config.simulation.deliveries;
        let quantity = self.config.simulation.quantity_per_order;

        if customers.is_empty() || products.is_empty() {
            tracing::warn!(wanted, "Nothing to order, seed customers and products first");
            return Ok((Vec::new(), wanted));
        }

        let mut placed = Vec::with_capacity(wanted);
        let mut rejected = 0;

        for i in 0..wanted {
            let customer = &customers[i % customers.len()];
            let product = &products[i % products.len()];

            match self
                .orders
                .create_order(customer, &[OrderLine::new(product.id, quantity)])
            {
                Ok(order) => {
                    self.journal.record(format!("Created Order {}", order.id));
                    placed.push(order);
                }
                Err(err @ CoreError::Invariant(_)) => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(
                        customer_id = %customer.id,
                        product_id = %product.id,
                        error = %err,
                        "Order rejected"
                    );
                    rejected += 1;
                }
            }
        }

        Ok((placed, rejected))
    }

    /// Seed, order, deliver, then export the delivery report
    pub async fn run(&self, writer: &dyn ReportWriter) -> SimResult<RunSummary> {
        let seeded = self.seed()?;
        let (orders, orders_rejected) = self.place_orders()?;
        let orders_placed = orders.len();

        let batch = self.simulation().run(orders.clone()).await;

        let report_path = default_report_path(
            &self.config.report.directory,
            self.config.report.format,
        );
        writer
            .write_report(&self.dispatcher.list_deliveries(), &report_path)
            .await?;

        let summary = RunSummary {
            seeded,
            orders_placed,
            orders_rejected,
            batch,
            total_revenue: self.orders.total_revenue(),
            discounted_revenue: orders.iter().map(|order| self.orders.quote(order)).sum(),
            mean_order_value: self.orders.mean_order_value(),
            highest_value_order: self.orders.highest_value_order().map(|order| order.id),
            report_path,
        };

        tracing::info!(
            placed = summary.orders_placed,
            rejected = summary.orders_rejected,
            delivered = summary.batch.delivered(),
            skipped = summary.batch.skipped(),
            revenue = summary.total_revenue,
            "Simulation complete"
        );
        for fault in summary.batch.faults() {
            tracing::warn!(fault = %fault, "Delivery fault");
        }

        Ok(summary)
    }
}
