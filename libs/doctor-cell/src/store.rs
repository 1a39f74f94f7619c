// libs/doctor-cell/src/store.rs
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{SlotError, SlotKey, TimeSlot};

/// Persistence port for the slot inventory. Slots are keyed by
/// (doctor, date, start time); a day's slots are written once and then
/// only flipped between available and occupied.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn day_exists(&self, doctor_id: Uuid, date: NaiveDate) -> bool;

    /// Stores a freshly generated day. A day that already exists is left
    /// untouched, which keeps regeneration idempotent.
    async fn insert_day(&self, doctor_id: Uuid, date: NaiveDate, slots: Vec<TimeSlot>);

    /// All slots of a day, ordered by start time.
    async fn day_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<TimeSlot>;

    async fn get(&self, key: &SlotKey) -> Option<TimeSlot>;

    async fn update(&self, slot: TimeSlot) -> Result<(), SlotError>;
}

/// In-memory slot store; a (doctor, date) partition maps start times to
/// slots so day listings come out ordered.
pub struct InMemorySlotStore {
    days: RwLock<HashMap<(Uuid, NaiveDate), BTreeMap<NaiveTime, TimeSlot>>>,
}

impl InMemorySlotStore {
    pub fn new() -> Self {
        Self {
            days: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySlotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlotStore for InMemorySlotStore {
    async fn day_exists(&self, doctor_id: Uuid, date: NaiveDate) -> bool {
        let days = self.days.read().await;
        days.contains_key(&(doctor_id, date))
    }

    async fn insert_day(&self, doctor_id: Uuid, date: NaiveDate, slots: Vec<TimeSlot>) {
        let mut days = self.days.write().await;
        days.entry((doctor_id, date)).or_insert_with(|| {
            slots
                .into_iter()
                .map(|slot| (slot.start_time, slot))
                .collect()
        });
    }

    async fn day_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<TimeSlot> {
        let days = self.days.read().await;
        days.get(&(doctor_id, date))
            .map(|day| day.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn get(&self, key: &SlotKey) -> Option<TimeSlot> {
        let days = self.days.read().await;
        days.get(&(key.doctor_id, key.date))
            .and_then(|day| day.get(&key.start_time))
            .cloned()
    }

    async fn update(&self, slot: TimeSlot) -> Result<(), SlotError> {
        let mut days = self.days.write().await;
        let day = days
            .get_mut(&(slot.doctor_id, slot.date))
            .ok_or_else(|| SlotError::NotFound(slot.key()))?;
        match day.get_mut(&slot.start_time) {
            Some(existing) => {
                *existing = slot;
                Ok(())
            }
            None => Err(SlotError::NotFound(slot.key())),
        }
    }
}
