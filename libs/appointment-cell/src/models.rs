// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::SlotKey;
use shared_models::AppointmentStatus;

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

/// The canonical appointment record. Owns the lifecycle status; the queue
/// entry and the slot occupancy are projections kept in sync by the
/// scheduling service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub department: String,
    pub slot: SlotKey,
    pub end_time: NaiveTime,
    pub queue_number: i32,
    pub status: AppointmentStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub cancellation_reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub prescription: Option<Prescription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn date(&self) -> NaiveDate {
        self.slot.date
    }
}

/// One step of an appointment's lifecycle, appended on every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: AppointmentStatus,
    pub changed_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub slot: SlotKey,
}

// ==============================================================================
// PRESCRIPTION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub duration: String,
    pub instructions: Option<String>,
}

/// Issued when a consultation completes; attached to the appointment
/// record rather than stored separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub medicines: Vec<Medicine>,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub issued_at: DateTime<Utc>,
}

// ==============================================================================
// QUERY MODELS
// ==============================================================================

/// Rolling window for history queries, measured back from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Today,
    Week,
    Month,
    All,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilters {
    pub status: Option<AppointmentStatus>,
    pub doctor_id: Option<Uuid>,
    pub range: Option<DateRange>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Time slot does not exist")]
    SlotNotFound,

    #[error("Time slot is not available for booking")]
    SlotUnavailable,

    #[error("Requested date lies beyond the advance booking horizon")]
    BeyondBookingHorizon,

    #[error("Patient already has an active appointment with this doctor on this date")]
    DuplicateBooking,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Operation not allowed while appointment is {0}")]
    InvalidState(AppointmentStatus),

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Rescheduling must keep the same doctor")]
    DoctorMismatch,

    #[error("Doctor is not accepting appointments")]
    DoctorNotAvailable,

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
