use crate::report::ReportFormat;
use crate::StoreResult;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tote_catalog::NewProduct;
use tote_core::NewCustomer;
use tote_dispatch::NewCourier;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub discounts: DiscountConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub seed: SeedData,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Fixed time every delivery spends in transit
    #[serde(default = "default_transit_millis")]
    pub transit_millis: u64,
    /// Units of work per batch
    pub deliveries: usize,
    #[serde(default = "default_quantity")]
    pub quantity_per_order: u32,
}

fn default_transit_millis() -> u64 { 5_000 }
fn default_quantity() -> u32 { 1 }

#[derive(Debug, Deserialize, Clone)]
pub struct DiscountConfig {
    #[serde(default = "default_vip_rate")]
    pub vip_rate: f64,
    #[serde(default = "default_category_rates")]
    pub category_rates: HashMap<String, f64>,
}

fn default_vip_rate() -> f64 { tote_catalog::pricing::DEFAULT_VIP_RATE }

fn default_category_rates() -> HashMap<String, f64> {
    [
        ("electronics", 0.50),
        ("shirt", 0.10),
        ("jackets", 0.45),
        ("shoes", 0.20),
    ]
    .into_iter()
    .map(|(category, rate)| (category.to_string(), rate))
    .collect()
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            vip_rate: default_vip_rate(),
            category_rates: default_category_rates(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_report_dir")]
    pub directory: PathBuf,
    #[serde(default)]
    pub format: ReportFormat,
}

fn default_report_dir() -> PathBuf { PathBuf::from("reports") }

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: default_report_dir(),
            format: ReportFormat::default(),
        }
    }
}

/// Records loaded into the stores before a simulation run
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedData {
    #[serde(default)]
    pub customers: Vec<NewCustomer>,
    #[serde(default)]
    pub products: Vec<NewProduct>,
    #[serde(default)]
    pub couriers: Vec<NewCourier>,
}

impl Config {
    pub fn load() -> StoreResult<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `TOTE__SIMULATION__TRANSIT_MILLIS=10`
            .add_source(config::Environment::with_prefix("TOTE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Build a configuration from inline TOML, without files or environment
    pub fn from_toml_str(raw: &str) -> StoreResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn transit(&self) -> Duration {
        Duration::from_millis(self.simulation.transit_millis)
    }
}
