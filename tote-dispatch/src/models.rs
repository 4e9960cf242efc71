use crate::courier::{Courier, CourierRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tote_core::{CoreError, CourierId, OrderId};
use tote_order::{Order, OrderSummary};
use uuid::Uuid;

/// Delivery lifecycle; `Delivered` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delivered,
}

impl DeliveryStatus {
    /// Position in the lifecycle, used to reject moves backwards
    pub fn stage(self) -> u8 {
        match self {
            DeliveryStatus::Pending => 0,
            DeliveryStatus::InTransit => 1,
            DeliveryStatus::Delivered => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == DeliveryStatus::Delivered
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "Pending",
            DeliveryStatus::InTransit => "In Transit",
            DeliveryStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "" => Err(CoreError::invalid("delivery status must not be blank")),
            "pending" => Ok(DeliveryStatus::Pending),
            "intransit" => Ok(DeliveryStatus::InTransit),
            "delivered" => Ok(DeliveryStatus::Delivered),
            _ => Err(CoreError::invalid(format!("unknown delivery status '{}'", raw.trim()))),
        }
    }
}

/// One order travelling with one courier.
///
/// Order and courier are shared with their stores, not copied.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: Uuid,
    pub order: Arc<Order>,
    pub courier: CourierRef,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(order: Arc<Order>, courier: CourierRef) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order,
            courier,
            status: DeliveryStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order.id
    }

    pub fn courier_id(&self) -> CourierId {
        self.courier.id()
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn record(&self) -> DeliveryRecord {
        DeliveryRecord {
            id: self.id,
            order: self.order.summary(),
            courier: self.courier.snapshot(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Delivery {} | order #{} for {} ({:.2}) | courier {} {} [{}] | {} | created {}",
            self.id,
            self.order.id,
            self.order.customer.name,
            self.order.total(),
            self.courier.id(),
            self.courier.name(),
            self.courier.vehicle_type(),
            self.status,
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

/// Serializable view of a delivery, used by reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub order: OrderSummary,
    pub courier: Courier,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
