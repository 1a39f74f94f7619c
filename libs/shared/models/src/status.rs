use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an appointment. The allowed transitions between
/// statuses are owned by the appointment lifecycle service; this enum only
/// carries the vocabulary shared between the appointment record and its
/// queue projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Booked,
    CheckedIn,
    InConsultation,
    Completed,
    Cancelled,
    Rejected,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::CheckedIn => write!(f, "checked_in"),
            AppointmentStatus::InConsultation => write!(f, "in_consultation"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl AppointmentStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::Rejected
        )
    }

    /// Active appointments occupy a slot and hold a live queue number.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}
