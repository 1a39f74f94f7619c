// libs/doctor-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// DOCTOR MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub department: String,
    pub is_available: bool,
    pub weekly_hours: WeeklyHours,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One bookable window of a working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DayWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

/// Per-weekday working hours. A `None` day is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub monday: Option<DayWindow>,
    pub tuesday: Option<DayWindow>,
    pub wednesday: Option<DayWindow>,
    pub thursday: Option<DayWindow>,
    pub friday: Option<DayWindow>,
    pub saturday: Option<DayWindow>,
    pub sunday: Option<DayWindow>,
}

impl WeeklyHours {
    /// Standard clinic week: Mon-Fri 09:00-17:00, Saturday 10:00-14:00,
    /// Sunday closed.
    pub fn standard() -> Self {
        let weekday = DayWindow::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        let saturday = DayWindow::new(
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        );
        Self {
            monday: Some(weekday),
            tuesday: Some(weekday),
            wednesday: Some(weekday),
            thursday: Some(weekday),
            friday: Some(weekday),
            saturday: Some(saturday),
            sunday: None,
        }
    }

    pub fn window_for(&self, weekday: Weekday) -> Option<DayWindow> {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub department: String,
    pub weekly_hours: Option<WeeklyHours>,
}

// ==============================================================================
// TIME SLOT MODELS
// ==============================================================================

/// Composite key of a slot: one doctor, one date, one start time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

impl SlotKey {
    pub fn new(doctor_id: Uuid, date: NaiveDate, start_time: NaiveTime) -> Self {
        Self {
            doctor_id,
            date,
            start_time,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.doctor_id,
            self.date,
            self.start_time.format("%H:%M")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    /// Lookup aid only; the appointment record owns the relationship.
    pub appointment_id: Option<Uuid>,
}

impl TimeSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.doctor_id, self.date, self.start_time)
    }

    pub fn start_instant(&self) -> DateTime<Utc> {
        self.date.and_time(self.start_time).and_utc()
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor is not accepting appointments")]
    NotAvailable,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SlotError {
    #[error("Time slot {0} does not exist")]
    NotFound(SlotKey),

    #[error("Time slot {0} is not bookable")]
    Unavailable(SlotKey),
}
