// libs/queue-cell/src/store.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::QueueError;
use crate::models::QueueEntry;

/// Persistence port for queue entries, keyed by appointment id with a
/// (doctor, date) partition view.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn insert(&self, entry: QueueEntry);

    async fn get(&self, appointment_id: Uuid) -> Option<QueueEntry>;

    async fn update(&self, entry: QueueEntry) -> Result<(), QueueError>;

    async fn remove(&self, appointment_id: Uuid) -> Option<QueueEntry>;

    /// All entries of one partition, ordered by queue number.
    async fn partition(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<QueueEntry>;
}

pub struct InMemoryQueueStore {
    entries: RwLock<HashMap<Uuid, QueueEntry>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn insert(&self, entry: QueueEntry) {
        let mut entries = self.entries.write().await;
        entries.insert(entry.appointment_id, entry);
    }

    async fn get(&self, appointment_id: Uuid) -> Option<QueueEntry> {
        let entries = self.entries.read().await;
        entries.get(&appointment_id).cloned()
    }

    async fn update(&self, entry: QueueEntry) -> Result<(), QueueError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&entry.appointment_id) {
            Some(existing) => {
                *existing = entry;
                Ok(())
            }
            None => Err(QueueError::EntryNotFound(entry.appointment_id)),
        }
    }

    async fn remove(&self, appointment_id: Uuid) -> Option<QueueEntry> {
        let mut entries = self.entries.write().await;
        entries.remove(&appointment_id)
    }

    async fn partition(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<QueueEntry> {
        let entries = self.entries.read().await;
        let mut partition: Vec<QueueEntry> = entries
            .values()
            .filter(|entry| entry.doctor_id == doctor_id && entry.date == date)
            .cloned()
            .collect();
        partition.sort_by_key(|entry| entry.queue_number);
        partition
    }
}
