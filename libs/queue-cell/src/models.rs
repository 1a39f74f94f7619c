// libs/queue-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::AppointmentStatus;

/// Denormalized projection of an appointment used for ordering and display
/// within one (doctor, date) partition. Status and queue number mirror the
/// source appointment at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub queue_number: i32,
    pub status: AppointmentStatus,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Active entries occupy a live position; terminal entries keep their
    /// number as history only.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
