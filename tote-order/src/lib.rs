pub mod models;
pub mod manager;

pub use models::{Order, OrderItem, OrderLine, OrderSummary};
pub use manager::OrderCoordinator;
