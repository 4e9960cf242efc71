use crate::product::Product;
use std::collections::HashMap;
use tote_core::Customer;

/// Loyalty rate granted to VIP customers
pub const DEFAULT_VIP_RATE: f64 = 0.10;

/// A single discount rule.
///
/// Strategies are evaluated independently and never see each other's
/// results; the engine combines them.
pub trait DiscountStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Discount rate for this pair, as a fraction of the base price
    fn rate(&self, customer: &Customer, product: &Product) -> f64;
}

/// Flat loyalty discount for VIP customers
#[derive(Debug, Clone)]
pub struct VipDiscount {
    rate: f64,
}

impl VipDiscount {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl Default for VipDiscount {
    fn default() -> Self {
        Self::new(DEFAULT_VIP_RATE)
    }
}

impl DiscountStrategy for VipDiscount {
    fn name(&self) -> &str {
        "vip"
    }

    fn rate(&self, customer: &Customer, _product: &Product) -> f64 {
        if customer.is_vip {
            self.rate
        } else {
            0.0
        }
    }
}

/// Fixed per-category rates, matched case-insensitively
#[derive(Debug, Clone)]
pub struct CategoryDiscount {
    rates: HashMap<String, f64>,
}

impl CategoryDiscount {
    pub fn new<I, K>(rates: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        Self {
            rates: rates
                .into_iter()
                .map(|(category, rate)| (category.as_ref().trim().to_lowercase(), rate))
                .collect(),
        }
    }

    pub fn is_discounted(&self, product: &Product) -> bool {
        self.rates.contains_key(&product.category_key())
    }
}

impl Default for CategoryDiscount {
    fn default() -> Self {
        Self::new([
            ("electronics", 0.50),
            ("shirt", 0.10),
            ("jackets", 0.45),
            ("shoes", 0.20),
        ])
    }
}

impl DiscountStrategy for CategoryDiscount {
    fn name(&self) -> &str {
        "category"
    }

    fn rate(&self, _customer: &Customer, product: &Product) -> f64 {
        self.rates
            .get(&product.category_key())
            .copied()
            .unwrap_or(0.0)
    }
}

/// Stateless pricing over an open set of discount strategies.
///
/// The combined discount is the sum of every strategy's rate, clamped to
/// `[0.0, 1.0]`.
pub struct DiscountEngine {
    strategies: Vec<Box<dyn DiscountStrategy>>,
}

impl DiscountEngine {
    /// Engine without any strategy; every price stays at its base value
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// VIP and category strategies with the built-in rates
    pub fn standard() -> Self {
        Self::empty()
            .with_strategy(VipDiscount::default())
            .with_strategy(CategoryDiscount::default())
    }

    /// VIP and category strategies with caller supplied rates
    pub fn from_rates<I, K>(vip_rate: f64, category_rates: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        Self::empty()
            .with_strategy(VipDiscount::new(vip_rate))
            .with_strategy(CategoryDiscount::new(category_rates))
    }

    pub fn with_strategy(mut self, strategy: impl DiscountStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Rate reported by each strategy, in registration order
    pub fn breakdown(&self, customer: &Customer, product: &Product) -> Vec<(&str, f64)> {
        self.strategies
            .iter()
            .map(|s| (s.name(), s.rate(customer, product)))
            .collect()
    }

    pub fn total_discount(&self, customer: &Customer, product: &Product) -> f64 {
        let sum: f64 = self
            .strategies
            .iter()
            .map(|s| s.rate(customer, product))
            .filter(|rate| rate.is_finite())
            .sum();
        sum.clamp(0.0, 1.0)
    }

    pub fn final_price(&self, customer: &Customer, product: &Product) -> f64 {
        let discount = self.total_discount(customer, product);
        let price = product.price * (1.0 - discount);
        tracing::trace!(
            product_id = %product.id,
            customer_id = %customer.id,
            base = product.price,
            discount,
            price,
            "Priced product"
        );
        price
    }
}

impl Default for DiscountEngine {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tote_core::{CustomerId, ProductId};

    fn customer(is_vip: bool) -> Customer {
        Customer {
            id: CustomerId(1),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            is_vip,
            registered_at: Utc::now(),
        }
    }

    fn product(category: &str, price: f64) -> Product {
        Product {
            id: ProductId(1),
            name: "Item".to_string(),
            category: category.to_string(),
            price,
            stock: 10,
            created_at: Utc::now(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_vip_only() {
        let engine = DiscountEngine::standard();
        assert_close(engine.final_price(&customer(true), &product("garden", 100.0)), 90.0);
    }

    #[test]
    fn test_category_only() {
        let engine = DiscountEngine::standard();
        assert_close(engine.final_price(&customer(false), &product("shoes", 100.0)), 80.0);
    }

    #[test]
    fn test_vip_and_category_add_up() {
        let engine = DiscountEngine::standard();
        let vip = customer(true);
        let shoes = product("shoes", 100.0);
        assert_close(engine.total_discount(&vip, &shoes), 0.30);
        assert_close(engine.final_price(&vip, &shoes), 70.0);
    }

    #[test]
    fn test_category_match_is_case_insensitive() {
        let engine = DiscountEngine::standard();
        assert_close(engine.final_price(&customer(false), &product("JACKETS", 100.0)), 55.0);
        assert_close(engine.final_price(&customer(false), &product("Shoes", 50.0)), 40.0);
    }

    #[test]
    fn test_no_discount_for_regular_unmatched() {
        let engine = DiscountEngine::standard();
        assert_close(engine.final_price(&customer(false), &product("garden", 42.0)), 42.0);
    }

    struct Clearance;

    impl DiscountStrategy for Clearance {
        fn name(&self) -> &str {
            "clearance"
        }

        fn rate(&self, _customer: &Customer, _product: &Product) -> f64 {
            0.9
        }
    }

    #[test]
    fn test_total_clamped_to_full_price() {
        let engine = DiscountEngine::standard().with_strategy(Clearance);
        let vip = customer(true);
        let tv = product("electronics", 300.0);

        assert_eq!(engine.strategy_names(), vec!["vip", "category", "clearance"]);
        assert_close(engine.total_discount(&vip, &tv), 1.0);
        assert_close(engine.final_price(&vip, &tv), 0.0);
    }

    struct Surcharge;

    impl DiscountStrategy for Surcharge {
        fn name(&self) -> &str {
            "surcharge"
        }

        fn rate(&self, _customer: &Customer, _product: &Product) -> f64 {
            -0.5
        }
    }

    #[test]
    fn test_total_never_negative() {
        let engine = DiscountEngine::empty().with_strategy(Surcharge);
        assert_close(engine.final_price(&customer(false), &product("garden", 10.0)), 10.0);
    }

    #[test]
    fn test_custom_rates() {
        let engine = DiscountEngine::from_rates(0.05, [("Books", 0.15)]);
        let breakdown = engine.breakdown(&customer(true), &product("books", 100.0));
        assert_eq!(breakdown.len(), 2);
        assert_close(breakdown[0].1, 0.05);
        assert_close(breakdown[1].1, 0.15);
        assert_close(engine.final_price(&customer(true), &product("books", 100.0)), 80.0);
    }

    #[test]
    fn test_is_discounted() {
        let table = CategoryDiscount::default();
        assert!(table.is_discounted(&product("Shirt", 1.0)));
        assert!(!table.is_discounted(&product("hats", 1.0)));
    }
}
