// libs/queue-cell/src/services/allocator.rs
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::AppointmentStatus;

use crate::error::QueueError;
use crate::models::QueueEntry;
use crate::store::QueueStore;

/// Assigns and renumbers sequential queue positions per doctor per day.
///
/// Invariant: after any removal, the numbers of the active entries of a
/// partition form a contiguous 1..=N sequence. Terminal entries keep the
/// number they held when they left the active set.
pub struct QueueAllocatorService {
    store: Arc<dyn QueueStore>,
}

impl QueueAllocatorService {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self { store }
    }

    /// Next free position: max of the active numbers plus one, or 1 for an
    /// empty partition. Callers serialize per partition, so the snapshot
    /// read here stays valid until the entry is inserted.
    pub async fn next_number(&self, doctor_id: Uuid, date: NaiveDate) -> i32 {
        let partition = self.store.partition(doctor_id, date).await;
        partition
            .iter()
            .filter(|entry| entry.is_active())
            .map(|entry| entry.queue_number)
            .max()
            .map(|max| max + 1)
            .unwrap_or(1)
    }

    pub async fn enqueue(&self, entry: QueueEntry) {
        info!(
            "Queue entry {} for doctor {} on {} takes position {}",
            entry.appointment_id, entry.doctor_id, entry.date, entry.queue_number
        );
        self.store.insert(entry).await;
    }

    /// Mirrors an appointment status change into its queue entry.
    pub async fn sync_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<QueueEntry, QueueError> {
        let mut entry = self
            .store
            .get(appointment_id)
            .await
            .ok_or(QueueError::EntryNotFound(appointment_id))?;
        entry.status = status;
        self.store.update(entry.clone()).await?;
        debug!("Queue entry {} now {}", appointment_id, status);
        Ok(entry)
    }

    /// Removes the entry and closes the gap it leaves: every remaining
    /// active entry with a strictly greater number moves up one position.
    /// Terminal entries are left untouched.
    pub async fn remove_and_compact(
        &self,
        appointment_id: Uuid,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<QueueEntry>, QueueError> {
        let removed = self
            .store
            .remove(appointment_id)
            .await
            .ok_or(QueueError::EntryNotFound(appointment_id))?;

        let partition = self.store.partition(doctor_id, date).await;
        for mut entry in partition {
            if entry.is_active() && entry.queue_number > removed.queue_number {
                entry.queue_number -= 1;
                self.store.update(entry).await?;
            }
        }

        info!(
            "Removed queue entry {} (position {}) from doctor {} on {}",
            appointment_id, removed.queue_number, doctor_id, date
        );

        Ok(self.store.partition(doctor_id, date).await)
    }

    /// 1-based rank of the entry within the active, number-ordered part of
    /// its partition.
    pub async fn position_of(&self, appointment_id: Uuid) -> Result<i32, QueueError> {
        let entry = self
            .store
            .get(appointment_id)
            .await
            .ok_or(QueueError::EntryNotFound(appointment_id))?;

        if !entry.is_active() {
            return Err(QueueError::EntryNotFound(appointment_id));
        }

        let active = self.active_partition(entry.doctor_id, entry.date).await;
        active
            .iter()
            .position(|candidate| candidate.appointment_id == appointment_id)
            .map(|index| index as i32 + 1)
            .ok_or(QueueError::EntryNotFound(appointment_id))
    }

    pub async fn partition(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<QueueEntry> {
        self.store.partition(doctor_id, date).await
    }

    /// Active entries only, ordered by queue number.
    pub async fn active_partition(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<QueueEntry> {
        self.store
            .partition(doctor_id, date)
            .await
            .into_iter()
            .filter(|entry| entry.is_active())
            .collect()
    }

    pub async fn entry(&self, appointment_id: Uuid) -> Option<QueueEntry> {
        self.store.get(appointment_id).await
    }
}
