// libs/appointment-cell/src/store.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError};

/// Persistence port for appointment records.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: Appointment);

    async fn get(&self, id: Uuid) -> Option<Appointment>;

    async fn update(&self, appointment: Appointment) -> Result<(), AppointmentError>;

    /// All appointments of one patient, newest first.
    async fn by_patient(&self, patient_id: Uuid) -> Vec<Appointment>;

    /// All appointments of one doctor, newest first.
    async fn by_doctor(&self, doctor_id: Uuid) -> Vec<Appointment>;

    /// All appointments of one doctor on one date, ordered by slot start.
    async fn by_doctor_and_date(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<Appointment>;
}

pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryAppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, appointment: Appointment) {
        let mut appointments = self.appointments.write().await;
        appointments.insert(appointment.id, appointment);
    }

    async fn get(&self, id: Uuid) -> Option<Appointment> {
        let appointments = self.appointments.read().await;
        appointments.get(&id).cloned()
    }

    async fn update(&self, appointment: Appointment) -> Result<(), AppointmentError> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment;
                Ok(())
            }
            None => Err(AppointmentError::NotFound),
        }
    }

    async fn by_patient(&self, patient_id: Uuid) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        let mut matching: Vec<Appointment> = appointments
            .values()
            .filter(|appointment| appointment.patient_id == patient_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }

    async fn by_doctor(&self, doctor_id: Uuid) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        let mut matching: Vec<Appointment> = appointments
            .values()
            .filter(|appointment| appointment.doctor_id == doctor_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }

    async fn by_doctor_and_date(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        let mut matching: Vec<Appointment> = appointments
            .values()
            .filter(|appointment| {
                appointment.doctor_id == doctor_id && appointment.slot.date == date
            })
            .cloned()
            .collect();
        matching.sort_by_key(|appointment| appointment.slot.start_time);
        matching
    }
}
