// libs/doctor-cell/src/services/inventory.rs
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{Doctor, DoctorError, SlotError, SlotKey, TimeSlot};
use crate::services::registry::DoctorRegistryService;
use crate::store::SlotStore;

/// Generates and tracks bookable time slots per doctor per day.
///
/// A day's slots are materialized lazily the first time the (doctor, date)
/// pair is queried and never regenerated afterwards; slot state then only
/// flips between available and occupied.
pub struct SlotInventoryService {
    store: Arc<dyn SlotStore>,
    registry: Arc<DoctorRegistryService>,
    slot_duration: Duration,
    lunch_break_hour: u32,
}

impl SlotInventoryService {
    pub fn new(
        store: Arc<dyn SlotStore>,
        registry: Arc<DoctorRegistryService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            registry,
            slot_duration: Duration::minutes(config.slot_duration_minutes),
            lunch_break_hour: config.lunch_break_hour,
        }
    }

    /// All slots for the doctor on the given date, generating the day on
    /// first access. Re-invocation returns the cached day unchanged.
    pub async fn slots_for(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, DoctorError> {
        if !self.store.day_exists(doctor_id, date).await {
            let doctor = self.registry.get(doctor_id).await?;
            let slots = self.generate_day(&doctor, date, now);
            debug!(
                "Materialized {} slots for doctor {} on {}",
                slots.len(),
                doctor_id,
                date
            );
            self.store.insert_day(doctor_id, date, slots).await;
        }

        Ok(self.store.day_slots(doctor_id, date).await)
    }

    pub async fn get(&self, key: &SlotKey) -> Option<TimeSlot> {
        self.store.get(key).await
    }

    /// Claims a slot for an appointment. Re-marking an already occupied
    /// slot keeps the original occupant; a real conflict is caught by the
    /// caller before this point.
    pub async fn mark_booked(
        &self,
        key: &SlotKey,
        appointment_id: Uuid,
    ) -> Result<TimeSlot, SlotError> {
        let mut slot = self
            .store
            .get(key)
            .await
            .ok_or_else(|| SlotError::NotFound(key.clone()))?;

        if slot.is_available {
            slot.is_available = false;
            slot.appointment_id = Some(appointment_id);
            self.store.update(slot.clone()).await?;
            info!("Slot {} claimed by appointment {}", key, appointment_id);
        } else {
            warn!(
                "Slot {} already occupied by {:?}, ignoring re-mark",
                key, slot.appointment_id
            );
        }

        Ok(slot)
    }

    /// Releases a slot back into the pool. Freeing an already available
    /// slot is a no-op.
    pub async fn free(&self, key: &SlotKey) -> Result<TimeSlot, SlotError> {
        let mut slot = self
            .store
            .get(key)
            .await
            .ok_or_else(|| SlotError::NotFound(key.clone()))?;

        if !slot.is_available {
            slot.is_available = true;
            slot.appointment_id = None;
            self.store.update(slot.clone()).await?;
            info!("Slot {} released", key);
        }

        Ok(slot)
    }

    /// A slot is bookable only if it exists, is unoccupied, and its start
    /// instant has not passed.
    pub async fn is_bookable(&self, key: &SlotKey, now: DateTime<Utc>) -> bool {
        match self.store.get(key).await {
            Some(slot) => slot.is_available && slot.start_instant() > now,
            None => false,
        }
    }

    fn generate_day(&self, doctor: &Doctor, date: NaiveDate, now: DateTime<Utc>) -> Vec<TimeSlot> {
        use chrono::Datelike;

        let Some(window) = doctor.weekly_hours.window_for(date.weekday()) else {
            return Vec::new();
        };

        let window_start = date.and_time(window.start).and_utc();
        let window_end = date.and_time(window.end).and_utc();

        let mut slots = Vec::new();
        let mut current = window_start;

        while current + self.slot_duration <= window_end {
            let slot_end = current + self.slot_duration;

            let in_lunch_break = current.hour() == self.lunch_break_hour;
            let already_passed = current <= now;

            if !in_lunch_break && !already_passed {
                slots.push(TimeSlot {
                    doctor_id: doctor.id,
                    date,
                    start_time: current.time(),
                    end_time: slot_end.time(),
                    is_available: true,
                    appointment_id: None,
                });
            }

            current = slot_end;
        }

        slots
    }
}
