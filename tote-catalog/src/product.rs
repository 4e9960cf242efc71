use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tote_core::{require_text, CoreError, CoreResult, ProductId};

/// Point-in-time view of a catalog product and its stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Matched case-insensitively by category discounts
    pub category: String,
    pub price: f64,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// Lower-cased category used for rate lookups
    pub fn category_key(&self) -> String {
        self.category.trim().to_lowercase()
    }
}

/// Catalog entry to be added; the inventory assigns the identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: u32,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        stock: u32,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            price,
            stock,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_text("product name", &self.name)?;
        require_text("product category", &self.category)?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CoreError::invalid(format!(
                "price must be a non-negative amount, got {}",
                self.price
            )));
        }
        Ok(())
    }
}
