pub mod courier;
pub mod models;
pub mod dispatcher;
pub mod simulation;

pub use courier::{Courier, CourierPool, CourierRef, NewCourier};
pub use models::{Delivery, DeliveryRecord, DeliveryStatus};
pub use dispatcher::DeliveryDispatcher;
pub use simulation::{BatchHandle, BatchReport, DeliverySimulation, TaskOutcome, TaskReport};
