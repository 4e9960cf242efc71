use crate::dispatcher::DeliveryDispatcher;
use crate::models::DeliveryStatus;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tote_core::{CoreError, CourierId, OrderId};
use tote_order::Order;
use uuid::Uuid;

/// Terminal state of one simulated delivery task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskOutcome {
    /// Transit elapsed and the courier went back to the pool
    Delivered { delivery_id: Uuid, courier_id: CourierId },
    /// Every courier was busy when the task tried to claim one
    Skipped,
    /// Interrupted in transit; finished early and released its courier
    Cancelled { delivery_id: Option<Uuid> },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

/// Aggregate result of a batch, in the order the work was requested
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub tasks: Vec<TaskReport>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&TaskOutcome) -> bool) -> usize {
        self.tasks.iter().filter(|t| pred(&t.outcome)).count()
    }

    pub fn delivered(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Delivered { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Skipped))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Cancelled { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Failed { .. }))
    }

    /// Human readable description of every cancelled or failed task
    pub fn faults(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter_map(|task| match &task.outcome {
                TaskOutcome::Cancelled {
                    delivery_id: Some(delivery_id),
                } => Some(format!(
                    "order {}: delivery {delivery_id} interrupted in transit",
                    task.order_id
                )),
                TaskOutcome::Cancelled { delivery_id: None } => {
                    Some(format!("order {}: interrupted before dispatch", task.order_id))
                }
                TaskOutcome::Failed { reason } => {
                    Some(format!("order {}: {reason}", task.order_id))
                }
                _ => None,
            })
            .collect()
    }
}

/// Runs one delivery task per order concurrently and waits for all of them.
///
/// Each task claims a courier, travels for the configured transit time and
/// then marks its delivery delivered, which frees the courier again.
pub struct DeliverySimulation {
    dispatcher: Arc<DeliveryDispatcher>,
    transit: Duration,
}

impl DeliverySimulation {
    pub fn new(dispatcher: Arc<DeliveryDispatcher>, transit: Duration) -> Self {
        Self { dispatcher, transit }
    }

    pub fn transit(&self) -> Duration {
        self.transit
    }

    /// Spawn every task and return immediately
    pub fn start(&self, orders: Vec<Arc<Order>>) -> BatchHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);

        tracing::info!(
            tasks = orders.len(),
            transit_ms = self.transit.as_millis() as u64,
            "Starting delivery batch"
        );

        let tasks = orders
            .into_iter()
            .map(|order| {
                let order_id = order.id;
                let opened = Arc::new(Mutex::new(None));
                let handle = tokio::spawn(run_task(
                    self.dispatcher.clone(),
                    order,
                    self.transit,
                    cancel_rx.clone(),
                    opened.clone(),
                ));
                BatchTask {
                    order_id,
                    opened,
                    handle,
                }
            })
            .collect();

        BatchHandle { tasks, cancel_tx }
    }

    /// Run the whole batch and wait until every task is terminal
    pub async fn run(&self, orders: Vec<Arc<Order>>) -> BatchReport {
        self.start(orders).join().await
    }
}

struct BatchTask {
    order_id: OrderId,
    // delivery opened by the task, readable after an abort
    opened: Arc<Mutex<Option<Uuid>>>,
    handle: JoinHandle<TaskOutcome>,
}

/// Running batch; dropping it does not stop the tasks
pub struct BatchHandle {
    tasks: Vec<BatchTask>,
    cancel_tx: watch::Sender<bool>,
}

impl BatchHandle {
    /// Ask every task still in transit to finish early
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Abort the tasks outright; couriers held by them are still released
    pub fn abort(&self) {
        for task in &self.tasks {
            task.handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub async fn join(self) -> BatchReport {
        let mut report = BatchReport::default();

        for task in self.tasks {
            let order_id = task.order_id;
            let outcome = match task.handle.await {
                Ok(outcome) => outcome,
                Err(err) if err.is_cancelled() => TaskOutcome::Cancelled {
                    delivery_id: *task.opened.lock(),
                },
                Err(err) => {
                    tracing::error!(order_id = %order_id, error = %err, "Delivery task panicked");
                    TaskOutcome::Failed {
                        reason: format!("task panicked: {err}"),
                    }
                }
            };
            report.tasks.push(TaskReport { order_id, outcome });
        }

        tracing::info!(
            delivered = report.delivered(),
            skipped = report.skipped(),
            cancelled = report.cancelled(),
            failed = report.failed(),
            "Delivery batch finished"
        );
        report
    }
}

/// Holds a courier for an in-flight delivery.
///
/// If the owning task goes away before finishing (abort, panic, early
/// return) the delivery is closed and the courier released on drop.
struct CourierLease {
    dispatcher: Arc<DeliveryDispatcher>,
    delivery_id: Uuid,
    armed: bool,
}

impl CourierLease {
    fn new(dispatcher: Arc<DeliveryDispatcher>, delivery_id: Uuid) -> Self {
        Self {
            dispatcher,
            delivery_id,
            armed: true,
        }
    }

    fn complete(mut self) -> Result<(), CoreError> {
        self.armed = false;
        self.dispatcher
            .update_status(self.delivery_id, DeliveryStatus::Delivered)
            .map(|_| ())
    }
}

impl Drop for CourierLease {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(
            delivery_id = %self.delivery_id,
            "Delivery task stopped in transit, releasing courier"
        );
        if let Err(err) = self
            .dispatcher
            .update_status(self.delivery_id, DeliveryStatus::Delivered)
        {
            tracing::error!(
                delivery_id = %self.delivery_id,
                error = %err,
                "Failed to release courier"
            );
        }
    }
}

async fn run_task(
    dispatcher: Arc<DeliveryDispatcher>,
    order: Arc<Order>,
    transit: Duration,
    mut cancel: watch::Receiver<bool>,
    opened: Arc<Mutex<Option<Uuid>>>,
) -> TaskOutcome {
    let delivery = match dispatcher.assign(&order) {
        Ok(delivery) => delivery,
        Err(CoreError::NoCourierAvailable) => {
            tracing::info!(order_id = %order.id, "Skipping delivery, no courier free");
            return TaskOutcome::Skipped;
        }
        Err(err) => {
            return TaskOutcome::Failed {
                reason: err.to_string(),
            }
        }
    };

    *opened.lock() = Some(delivery.id);
    let courier_id = delivery.courier_id();
    let lease = CourierLease::new(dispatcher.clone(), delivery.id);

    if let Err(err) = dispatcher.update_status(delivery.id, DeliveryStatus::InTransit) {
        // lease drop closes the delivery
        return TaskOutcome::Failed {
            reason: err.to_string(),
        };
    }
    tracing::info!(
        order_id = %order.id,
        courier_id = %courier_id,
        courier = %delivery.courier.name(),
        "Starting delivery"
    );

    let interrupted = tokio::select! {
        _ = tokio::time::sleep(transit) => false,
        _ = cancelled(&mut cancel) => true,
    };

    if let Err(err) = lease.complete() {
        return TaskOutcome::Failed {
            reason: err.to_string(),
        };
    }

    if interrupted {
        tracing::warn!(
            order_id = %order.id,
            courier_id = %courier_id,
            "Delivery interrupted, courier released early"
        );
        TaskOutcome::Cancelled {
            delivery_id: Some(delivery.id),
        }
    } else {
        tracing::info!(order_id = %order.id, courier_id = %courier_id, "Order delivered");
        TaskOutcome::Delivered {
            delivery_id: delivery.id,
            courier_id,
        }
    }
}

/// Resolves once the batch is cancelled; never resolves if the sender is gone
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow_and_update() {
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
