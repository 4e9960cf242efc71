pub mod product;
pub mod pricing;
pub mod inventory;

pub use product::{NewProduct, Product};
pub use pricing::{CategoryDiscount, DiscountEngine, DiscountStrategy, VipDiscount};
pub use inventory::InventoryStore;
