// libs/doctor-cell/src/services/registry.rs
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{CreateDoctorRequest, Doctor, DoctorError, WeeklyHours};

/// Administrative registry of doctors. The scheduling engine only reads
/// from it; registration and availability toggles are back-office
/// operations.
pub struct DoctorRegistryService {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
}

impl DoctorRegistryService {
    pub fn new() -> Self {
        Self {
            doctors: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, request: CreateDoctorRequest) -> Doctor {
        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            first_name: request.first_name,
            last_name: request.last_name,
            specialty: request.specialty,
            department: request.department,
            is_available: true,
            weekly_hours: request.weekly_hours.unwrap_or_else(WeeklyHours::standard),
            created_at: now,
            updated_at: now,
        };

        let mut doctors = self.doctors.write().await;
        doctors.insert(doctor.id, doctor.clone());

        info!("Registered doctor {} ({})", doctor.id, doctor.full_name());
        doctor
    }

    pub async fn get(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let doctors = self.doctors.read().await;
        doctors.get(&doctor_id).cloned().ok_or(DoctorError::NotFound)
    }

    pub async fn list(&self) -> Vec<Doctor> {
        let doctors = self.doctors.read().await;
        let mut all: Vec<Doctor> = doctors.values().cloned().collect();
        all.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        all
    }

    pub async fn set_availability(
        &self,
        doctor_id: Uuid,
        is_available: bool,
    ) -> Result<Doctor, DoctorError> {
        debug!("Setting availability of doctor {} to {}", doctor_id, is_available);

        let mut doctors = self.doctors.write().await;
        let doctor = doctors.get_mut(&doctor_id).ok_or(DoctorError::NotFound)?;
        doctor.is_available = is_available;
        doctor.updated_at = Utc::now();
        Ok(doctor.clone())
    }
}

impl Default for DoctorRegistryService {
    fn default() -> Self {
        Self::new()
    }
}
