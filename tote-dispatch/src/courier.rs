use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tote_core::{require_text, CoreError, CoreResult, CourierId, Sequence};

/// Snapshot of a courier and its availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Courier {
    pub id: CourierId,
    pub name: String,
    pub vehicle_type: String,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourier {
    pub name: String,
    pub vehicle_type: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl NewCourier {
    pub fn new(name: impl Into<String>, vehicle_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vehicle_type: vehicle_type.into(),
            available: true,
        }
    }
}

#[derive(Debug)]
struct CourierSlot {
    id: CourierId,
    name: String,
    vehicle_type: String,
    available: AtomicBool,
}

impl CourierSlot {
    fn snapshot(&self) -> Courier {
        Courier {
            id: self.id,
            name: self.name.clone(),
            vehicle_type: self.vehicle_type.clone(),
            available: self.available.load(Ordering::Acquire),
        }
    }

    /// Flip free -> busy; only one caller can win
    fn try_claim(&self) -> bool {
        self.available
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Shared handle to a courier registered in a [`CourierPool`].
///
/// Reads go to the pool's live record, so availability is always current.
#[derive(Debug, Clone)]
pub struct CourierRef(Arc<CourierSlot>);

impl CourierRef {
    pub fn id(&self) -> CourierId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn vehicle_type(&self) -> &str {
        &self.0.vehicle_type
    }

    pub fn is_available(&self) -> bool {
        self.0.available.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Courier {
        self.0.snapshot()
    }
}

/// Registered couriers in registration order.
///
/// Each courier carries its own availability flag, so claiming one courier
/// never blocks work on another.
pub struct CourierPool {
    couriers: RwLock<BTreeMap<CourierId, Arc<CourierSlot>>>,
    ids: Sequence,
}

impl CourierPool {
    pub fn new() -> Self {
        Self {
            couriers: RwLock::new(BTreeMap::new()),
            ids: Sequence::new(),
        }
    }

    pub fn add(&self, new: NewCourier) -> CoreResult<CourierId> {
        require_text("courier name", &new.name)?;
        require_text("vehicle type", &new.vehicle_type)?;

        let id: CourierId = self.ids.next_id();
        tracing::info!(
            courier_id = %id,
            name = %new.name,
            vehicle = %new.vehicle_type,
            "Added courier"
        );
        self.couriers.write().insert(
            id,
            Arc::new(CourierSlot {
                id,
                name: new.name,
                vehicle_type: new.vehicle_type,
                available: AtomicBool::new(new.available),
            }),
        );
        Ok(id)
    }

    pub fn find_by_id(&self, id: CourierId) -> CoreResult<Courier> {
        self.slot(id).map(|slot| slot.snapshot())
    }

    /// First free courier in registration order, without claiming it
    pub fn find_available(&self) -> Option<Courier> {
        self.couriers
            .read()
            .values()
            .find(|slot| slot.available.load(Ordering::Acquire))
            .map(|slot| slot.snapshot())
    }

    /// Find the first free courier and mark it busy as one step.
    ///
    /// Two concurrent callers never receive the same courier.
    pub fn claim_available(&self) -> Option<Courier> {
        self.claim().map(|courier| courier.snapshot())
    }

    /// Same as [`claim_available`](Self::claim_available), keeping a live
    /// handle to the claimed courier
    pub fn claim(&self) -> Option<CourierRef> {
        let couriers = self.couriers.read();
        let slot = couriers.values().find(|slot| slot.try_claim())?;
        tracing::debug!(courier_id = %slot.id, "Claimed courier");
        Some(CourierRef(slot.clone()))
    }

    pub fn mark_busy(&self, id: CourierId) -> CoreResult<()> {
        self.slot(id)?.available.store(false, Ordering::Release);
        Ok(())
    }

    pub fn mark_free(&self, id: CourierId) -> CoreResult<()> {
        self.slot(id)?.available.store(true, Ordering::Release);
        tracing::debug!(courier_id = %id, "Courier free");
        Ok(())
    }

    pub fn list_available(&self) -> Vec<Courier> {
        self.couriers
            .read()
            .values()
            .filter(|slot| slot.available.load(Ordering::Acquire))
            .map(|slot| slot.snapshot())
            .collect()
    }

    pub fn list_all(&self) -> Vec<Courier> {
        self.couriers.read().values().map(|slot| slot.snapshot()).collect()
    }

    pub fn len(&self) -> usize {
        self.couriers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.couriers.read().is_empty()
    }

    fn slot(&self, id: CourierId) -> CoreResult<Arc<CourierSlot>> {
        self.couriers
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Courier", id))
    }
}

impl Default for CourierPool {
    fn default() -> Self {
        Self::new()
    }
}
