use crate::product::{NewProduct, Product};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tote_core::{CoreError, CoreResult, ProductId, Sequence};

/// Stock tracking for one product.
///
/// The counter is only ever lowered through a compare-and-swap that checks
/// the requested quantity first, so it cannot underflow.
struct StockEntry {
    id: ProductId,
    name: String,
    category: String,
    price: f64,
    created_at: DateTime<Utc>,
    stock: AtomicU32,
}

impl StockEntry {
    fn snapshot(&self) -> Product {
        Product {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price,
            stock: self.stock.load(Ordering::Acquire),
            created_at: self.created_at,
        }
    }
}

/// In-memory product catalog with per-product atomic stock counters
pub struct InventoryStore {
    products: RwLock<BTreeMap<ProductId, Arc<StockEntry>>>,
    ids: Sequence,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(BTreeMap::new()),
            ids: Sequence::new(),
        }
    }

    /// Register a product with its opening stock
    pub fn add_product(&self, new: NewProduct) -> CoreResult<ProductId> {
        new.validate()?;

        let id: ProductId = self.ids.next_id();
        let entry = StockEntry {
            id,
            name: new.name,
            category: new.category,
            price: new.price,
            created_at: Utc::now(),
            stock: AtomicU32::new(new.stock),
        };

        tracing::info!(product_id = %id, name = %entry.name, stock = new.stock, "Added product");
        self.products.write().insert(id, Arc::new(entry));
        Ok(id)
    }

    pub fn find_by_id(&self, id: ProductId) -> CoreResult<Product> {
        self.entry(id).map(|entry| entry.snapshot())
    }

    /// Take `quantity` units out of stock, all at once or not at all.
    ///
    /// Concurrent reservations on the same product serialize on its counter;
    /// other products are unaffected.
    pub fn reserve_stock(&self, id: ProductId, quantity: u32) -> CoreResult<()> {
        if quantity == 0 {
            return Err(CoreError::invalid("quantity must be positive"));
        }

        let entry = self.entry(id)?;
        let reserved = entry
            .stock
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |available| {
                available.checked_sub(quantity)
            });

        match reserved {
            Ok(before) => {
                tracing::debug!(
                    product_id = %id,
                    quantity,
                    remaining = before - quantity,
                    "Reserved stock"
                );
                Ok(())
            }
            Err(available) => {
                tracing::warn!(product_id = %id, quantity, available, "Not enough stock");
                Err(CoreError::InsufficientStock {
                    product: entry.name.clone(),
                    requested: quantity,
                    available,
                })
            }
        }
    }

    /// `true` when the product exists and has at least one unit left
    pub fn is_available(&self, id: ProductId) -> bool {
        self.entry(id)
            .map(|entry| entry.stock.load(Ordering::Acquire) > 0)
            .unwrap_or(false)
    }

    /// Snapshot of every product in registration order
    pub fn list_all(&self) -> Vec<Product> {
        self.products
            .read()
            .values()
            .map(|entry| entry.snapshot())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }

    fn entry(&self, id: ProductId) -> CoreResult<Arc<StockEntry>> {
        self.products
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Product", id))
    }
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self::new()
    }
}
