// libs/appointment-cell/src/services/consistency.rs
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Serializes mutations per (doctor, date) partition. Queue numbering and
/// slot claiming are only consistent while exactly one mutation of a
/// partition runs at a time; everything that allocates or renumbers must
/// hold the partition lock first.
pub struct PartitionLockService {
    locks: Mutex<HashMap<(Uuid, NaiveDate), Arc<Mutex<()>>>>,
}

impl PartitionLockService {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, doctor_id: Uuid, date: NaiveDate) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // A strong count of 1 means no guard or pending acquire holds
            // the lock anymore, only the map itself; dropping those keeps
            // the map bounded by the number of partitions in flight.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry((doctor_id, date))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        debug!("Acquiring partition lock for doctor {} on {}", doctor_id, date);
        lock.lock_owned().await
    }

    /// Locks two partitions in a deterministic order so that concurrent
    /// cross-partition operations never deadlock. Returns a single guard
    /// when both keys name the same partition.
    pub async fn acquire_pair(
        &self,
        first: (Uuid, NaiveDate),
        second: (Uuid, NaiveDate),
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if first == second {
            return (self.acquire(first.0, first.1).await, None);
        }

        let (lo, hi) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };

        let lo_guard = self.acquire(lo.0, lo.1).await;
        let hi_guard = self.acquire(hi.0, hi.1).await;
        (lo_guard, Some(hi_guard))
    }
}

impl Default for PartitionLockService {
    fn default() -> Self {
        Self::new()
    }
}
