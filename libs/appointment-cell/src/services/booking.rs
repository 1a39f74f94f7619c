// libs/appointment-cell/src/services/booking.rs
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::{DoctorError, DoctorRegistryService, SlotError, SlotInventoryService, SlotKey};
use queue_cell::{QueueAllocatorService, QueueEntry, QueueError};
use shared_config::AppConfig;
use shared_models::AppointmentStatus;

use crate::models::{
    Appointment, AppointmentError, BookAppointmentRequest, DateRange, HistoryFilters,
    Prescription, StatusHistoryEntry,
};
use crate::services::consistency::PartitionLockService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::AppointmentStore;

/// Orchestrates the appointment lifecycle across the slot inventory, the
/// queue allocator and the status state machine. Every mutation of a
/// (doctor, date) partition runs under that partition's lock, so slot
/// claims and queue numbers stay consistent under concurrent callers.
pub struct SchedulingService {
    appointments: Arc<dyn AppointmentStore>,
    inventory: Arc<SlotInventoryService>,
    queue: Arc<QueueAllocatorService>,
    registry: Arc<DoctorRegistryService>,
    lifecycle: AppointmentLifecycleService,
    locks: PartitionLockService,
    max_advance_booking: chrono::Duration,
}

impl SchedulingService {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        inventory: Arc<SlotInventoryService>,
        queue: Arc<QueueAllocatorService>,
        registry: Arc<DoctorRegistryService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            appointments,
            inventory,
            queue,
            registry,
            lifecycle: AppointmentLifecycleService::new(),
            locks: PartitionLockService::new(),
            max_advance_booking: chrono::Duration::days(config.max_advance_booking_days),
        }
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.book_at(request, Utc::now()).await
    }

    /// Books a pending appointment on the requested slot: claims the slot,
    /// takes the next queue number and records the appointment, all under
    /// the partition lock.
    pub async fn book_at(
        &self,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let slot_key = request.slot.clone();
        debug!(
            "Booking request from patient {} for slot {}",
            request.patient_id, slot_key
        );

        if slot_key.date > now.date_naive() + self.max_advance_booking {
            warn!(
                "Slot {} lies beyond the booking horizon of {} days",
                slot_key,
                self.max_advance_booking.num_days()
            );
            return Err(AppointmentError::BeyondBookingHorizon);
        }

        let doctor = self
            .registry
            .get(slot_key.doctor_id)
            .await
            .map_err(map_doctor_error)?;
        if !doctor.is_available {
            warn!("Doctor {} is not accepting appointments", doctor.id);
            return Err(AppointmentError::DoctorNotAvailable);
        }

        let _guard = self.locks.acquire(slot_key.doctor_id, slot_key.date).await;

        // Materializes the day on first touch so the slot lookup below is
        // authoritative.
        self.inventory
            .slots_for(slot_key.doctor_id, slot_key.date, now)
            .await
            .map_err(map_doctor_error)?;

        if !self.inventory.is_bookable(&slot_key, now).await {
            return Err(self.classify_unbookable(&slot_key, now).await);
        }

        let same_day = self
            .appointments
            .by_doctor_and_date(slot_key.doctor_id, slot_key.date)
            .await;
        let duplicate = same_day.iter().any(|existing| {
            existing.patient_id == request.patient_id && existing.status.is_active()
        });
        if duplicate {
            warn!(
                "Patient {} already holds an active appointment with doctor {} on {}",
                request.patient_id, slot_key.doctor_id, slot_key.date
            );
            return Err(AppointmentError::DuplicateBooking);
        }

        let queue_number = self
            .queue
            .next_number(slot_key.doctor_id, slot_key.date)
            .await;

        let appointment_id = Uuid::new_v4();
        let slot = self
            .inventory
            .mark_booked(&slot_key, appointment_id)
            .await
            .map_err(map_slot_error)?;

        let appointment = Appointment {
            id: appointment_id,
            patient_id: request.patient_id,
            patient_name: request.patient_name.clone(),
            doctor_id: slot_key.doctor_id,
            doctor_name: doctor.full_name(),
            department: doctor.department.clone(),
            slot: slot_key.clone(),
            end_time: slot.end_time,
            queue_number,
            status: AppointmentStatus::Pending,
            status_history: vec![StatusHistoryEntry {
                status: AppointmentStatus::Pending,
                changed_at: now,
                reason: None,
            }],
            cancellation_reason: None,
            rejection_reason: None,
            prescription: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.appointments.insert(appointment.clone()).await;

        self.queue
            .enqueue(QueueEntry {
                appointment_id,
                patient_id: request.patient_id,
                patient_name: request.patient_name,
                doctor_id: slot_key.doctor_id,
                date: slot_key.date,
                queue_number,
                status: AppointmentStatus::Pending,
                enqueued_at: now,
            })
            .await;

        info!(
            "Appointment {} booked for slot {} with queue number {}",
            appointment_id, slot_key, queue_number
        );
        Ok(appointment)
    }

    // ==========================================================================
    // LIFECYCLE TRANSITIONS
    // ==========================================================================

    pub async fn approve(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.approve_at(appointment_id, Utc::now()).await
    }

    pub async fn approve_at(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let (mut appointment, _guard) = self.lock_current_partition(appointment_id).await?;

        self.apply_transition(&mut appointment, AppointmentStatus::Booked, None, now)?;
        self.appointments.update(appointment.clone()).await?;
        self.queue
            .sync_status(appointment_id, AppointmentStatus::Booked)
            .await
            .map_err(map_queue_error)?;

        info!("Appointment {} approved", appointment_id);
        Ok(appointment)
    }

    /// Rejects a pending appointment: the slot returns to the pool and the
    /// queue closes the gap the entry leaves.
    pub async fn reject(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        self.reject_at(appointment_id, reason, Utc::now()).await
    }

    pub async fn reject_at(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let (mut appointment, _guard) = self.lock_current_partition(appointment_id).await?;

        self.apply_transition(
            &mut appointment,
            AppointmentStatus::Rejected,
            reason.clone(),
            now,
        )?;
        appointment.rejection_reason = reason;
        self.appointments.update(appointment.clone()).await?;

        self.release_partition_seat(&appointment).await?;

        info!("Appointment {} rejected", appointment_id);
        Ok(appointment)
    }

    /// Cancels a booked or checked-in appointment. Frees the slot and
    /// renumbers the remaining queue entries behind it.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        self.cancel_at(appointment_id, reason, Utc::now()).await
    }

    pub async fn cancel_at(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let (mut appointment, _guard) = self.lock_current_partition(appointment_id).await?;

        self.apply_transition(
            &mut appointment,
            AppointmentStatus::Cancelled,
            reason.clone(),
            now,
        )?;
        appointment.cancellation_reason = reason;
        self.appointments.update(appointment.clone()).await?;

        self.release_partition_seat(&appointment).await?;

        info!("Appointment {} cancelled", appointment_id);
        Ok(appointment)
    }

    pub async fn check_in(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.check_in_at(appointment_id, Utc::now()).await
    }

    pub async fn check_in_at(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        self.simple_transition(appointment_id, AppointmentStatus::CheckedIn, now)
            .await
    }

    pub async fn start_consultation(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        self.start_consultation_at(appointment_id, Utc::now()).await
    }

    pub async fn start_consultation_at(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        self.simple_transition(appointment_id, AppointmentStatus::InConsultation, now)
            .await
    }

    /// Completes a consultation, optionally attaching the issued
    /// prescription. A booked or checked-in appointment is walked through
    /// the intermediate statuses so the history stays complete.
    pub async fn complete(
        &self,
        appointment_id: Uuid,
        prescription: Option<Prescription>,
    ) -> Result<Appointment, AppointmentError> {
        self.complete_at(appointment_id, prescription, Utc::now())
            .await
    }

    pub async fn complete_at(
        &self,
        appointment_id: Uuid,
        prescription: Option<Prescription>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let (mut appointment, _guard) = self.lock_current_partition(appointment_id).await?;

        if appointment.status == AppointmentStatus::Booked {
            self.apply_transition(&mut appointment, AppointmentStatus::CheckedIn, None, now)?;
        }
        if appointment.status == AppointmentStatus::CheckedIn {
            self.apply_transition(&mut appointment, AppointmentStatus::InConsultation, None, now)?;
        }
        self.apply_transition(&mut appointment, AppointmentStatus::Completed, None, now)?;

        appointment.prescription = prescription;
        appointment.completed_at = Some(now);
        self.appointments.update(appointment.clone()).await?;
        self.queue
            .sync_status(appointment_id, AppointmentStatus::Completed)
            .await
            .map_err(map_queue_error)?;

        info!("Appointment {} completed", appointment_id);
        Ok(appointment)
    }

    // ==========================================================================
    // RESCHEDULING
    // ==========================================================================

    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_slot: SlotKey,
    ) -> Result<Appointment, AppointmentError> {
        self.reschedule_at(appointment_id, new_slot, Utc::now())
            .await
    }

    /// Moves a booked appointment onto another slot of the same doctor.
    /// Moving to another date surrenders the old queue number and joins
    /// the back of the new day's queue.
    pub async fn reschedule_at(
        &self,
        appointment_id: Uuid,
        new_slot: SlotKey,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.require(appointment_id).await?;

        if new_slot.doctor_id != appointment.doctor_id {
            return Err(AppointmentError::DoctorMismatch);
        }
        if new_slot.date > now.date_naive() + self.max_advance_booking {
            return Err(AppointmentError::BeyondBookingHorizon);
        }

        let new_partition = (new_slot.doctor_id, new_slot.date);
        let (mut appointment, _guards) = loop {
            let snapshot = self.require(appointment_id).await?;
            let old_partition = (snapshot.doctor_id, snapshot.date());
            let guards = self.locks.acquire_pair(old_partition, new_partition).await;
            let current = self.require(appointment_id).await?;
            if current.date() == snapshot.date() {
                break (current, guards);
            }
        };

        if appointment.status != AppointmentStatus::Booked {
            return Err(AppointmentError::InvalidState(appointment.status));
        }

        self.inventory
            .slots_for(new_slot.doctor_id, new_slot.date, now)
            .await
            .map_err(map_doctor_error)?;

        if !self.inventory.is_bookable(&new_slot, now).await {
            return Err(self.classify_unbookable(&new_slot, now).await);
        }

        let old_slot = appointment.slot.clone();
        let old_date = appointment.date();

        if new_slot.date != old_date {
            let target_day = self
                .appointments
                .by_doctor_and_date(new_slot.doctor_id, new_slot.date)
                .await;
            let clash = target_day.iter().any(|existing| {
                existing.patient_id == appointment.patient_id
                    && existing.id != appointment.id
                    && existing.status.is_active()
            });
            if clash {
                return Err(AppointmentError::DuplicateBooking);
            }
        }

        self.inventory
            .free(&old_slot)
            .await
            .map_err(map_slot_error)?;
        let claimed = self
            .inventory
            .mark_booked(&new_slot, appointment_id)
            .await
            .map_err(map_slot_error)?;

        if new_slot.date != old_date {
            self.queue
                .remove_and_compact(appointment_id, appointment.doctor_id, old_date)
                .await
                .map_err(map_queue_error)?;
            let queue_number = self
                .queue
                .next_number(new_slot.doctor_id, new_slot.date)
                .await;
            self.queue
                .enqueue(QueueEntry {
                    appointment_id,
                    patient_id: appointment.patient_id,
                    patient_name: appointment.patient_name.clone(),
                    doctor_id: new_slot.doctor_id,
                    date: new_slot.date,
                    queue_number,
                    status: appointment.status,
                    enqueued_at: now,
                })
                .await;
            appointment.queue_number = queue_number;
        }

        appointment.slot = new_slot.clone();
        appointment.end_time = claimed.end_time;
        appointment.updated_at = now;
        self.appointments.update(appointment.clone()).await?;

        info!(
            "Appointment {} rescheduled from {} to {}",
            appointment_id, old_slot, new_slot
        );
        Ok(appointment)
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.require(appointment_id).await
    }

    pub async fn by_patient(&self, patient_id: Uuid) -> Vec<Appointment> {
        self.appointments.by_patient(patient_id).await
    }

    pub async fn by_doctor(&self, doctor_id: Uuid) -> Vec<Appointment> {
        self.appointments.by_doctor(doctor_id).await
    }

    pub async fn by_doctor_and_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Vec<Appointment> {
        self.appointments.by_doctor_and_date(doctor_id, date).await
    }

    /// Pending appointments awaiting the doctor's decision, oldest first.
    pub async fn pending_by_doctor(&self, doctor_id: Uuid) -> Vec<Appointment> {
        let mut pending: Vec<Appointment> = self
            .appointments
            .by_doctor(doctor_id)
            .await
            .into_iter()
            .filter(|appointment| appointment.status == AppointmentStatus::Pending)
            .collect();
        pending.sort_by_key(|appointment| appointment.created_at);
        pending
    }

    pub async fn history(
        &self,
        patient_id: Uuid,
        filters: &HistoryFilters,
    ) -> Vec<Appointment> {
        self.history_at(patient_id, filters, Utc::now().date_naive())
            .await
    }

    pub async fn history_at(
        &self,
        patient_id: Uuid,
        filters: &HistoryFilters,
        today: NaiveDate,
    ) -> Vec<Appointment> {
        self.appointments
            .by_patient(patient_id)
            .await
            .into_iter()
            .filter(|appointment| {
                filters
                    .status
                    .map_or(true, |status| appointment.status == status)
            })
            .filter(|appointment| {
                filters
                    .doctor_id
                    .map_or(true, |doctor_id| appointment.doctor_id == doctor_id)
            })
            .filter(|appointment| in_range(appointment.date(), filters.range, today))
            .collect()
    }

    /// Live 1-based position within the day's active queue.
    pub async fn queue_position(&self, appointment_id: Uuid) -> Result<i32, AppointmentError> {
        self.queue
            .position_of(appointment_id)
            .await
            .map_err(map_queue_error)
    }

    /// The active queue for one doctor's day, in serving order.
    pub async fn daily_queue(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<QueueEntry> {
        self.queue.active_partition(doctor_id, date).await
    }

    // ==========================================================================
    // INTERNALS
    // ==========================================================================

    /// A slot that exists but is occupied, or whose start has already
    /// elapsed (elapsed slots are never materialized, so they may not
    /// exist at all), is unavailable; only a key off the generated grid
    /// is unknown.
    async fn classify_unbookable(
        &self,
        key: &SlotKey,
        now: DateTime<Utc>,
    ) -> AppointmentError {
        let exists = self.inventory.get(key).await.is_some();
        let elapsed = key.date.and_time(key.start_time).and_utc() <= now;
        if exists || elapsed {
            AppointmentError::SlotUnavailable
        } else {
            AppointmentError::SlotNotFound
        }
    }

    async fn require(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .get(appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)
    }

    /// Locks the partition the appointment currently belongs to. The lock
    /// key comes from a read taken before the guard is held, so a
    /// concurrent reschedule can move the appointment to another date in
    /// between; the partition is re-checked under the guard and the
    /// acquire retried until the locked key matches.
    async fn lock_current_partition(
        &self,
        appointment_id: Uuid,
    ) -> Result<(Appointment, OwnedMutexGuard<()>), AppointmentError> {
        loop {
            let snapshot = self.require(appointment_id).await?;
            let guard = self
                .locks
                .acquire(snapshot.doctor_id, snapshot.date())
                .await;
            let current = self.require(appointment_id).await?;
            if current.date() == snapshot.date() {
                return Ok((current, guard));
            }
            debug!(
                "Appointment {} moved from {} while locking, retrying",
                appointment_id,
                snapshot.date()
            );
        }
    }

    fn apply_transition(
        &self,
        appointment: &mut Appointment,
        next: AppointmentStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        self.lifecycle.validate_transition(appointment.status, next)?;
        appointment.status = next;
        appointment.status_history.push(StatusHistoryEntry {
            status: next,
            changed_at: now,
            reason,
        });
        appointment.updated_at = now;
        Ok(())
    }

    async fn simple_transition(
        &self,
        appointment_id: Uuid,
        next: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let (mut appointment, _guard) = self.lock_current_partition(appointment_id).await?;

        self.apply_transition(&mut appointment, next, None, now)?;
        self.appointments.update(appointment.clone()).await?;
        self.queue
            .sync_status(appointment_id, next)
            .await
            .map_err(map_queue_error)?;

        info!("Appointment {} moved to {}", appointment_id, next);
        Ok(appointment)
    }

    /// Frees the slot and drops the queue entry, renumbering the entries
    /// behind it. Used by both the reject and cancel paths.
    async fn release_partition_seat(
        &self,
        appointment: &Appointment,
    ) -> Result<(), AppointmentError> {
        self.inventory
            .free(&appointment.slot)
            .await
            .map_err(map_slot_error)?;
        self.queue
            .remove_and_compact(appointment.id, appointment.doctor_id, appointment.date())
            .await
            .map_err(map_queue_error)?;
        Ok(())
    }
}

fn in_range(date: NaiveDate, range: Option<DateRange>, today: NaiveDate) -> bool {
    match range.unwrap_or(DateRange::All) {
        DateRange::Today => date == today,
        DateRange::Week => date >= today - chrono::Duration::days(7) && date <= today,
        DateRange::Month => date >= today - chrono::Duration::days(30) && date <= today,
        DateRange::All => true,
    }
}

fn map_doctor_error(error: DoctorError) -> AppointmentError {
    match error {
        DoctorError::NotFound => AppointmentError::DoctorNotFound,
        DoctorError::NotAvailable => AppointmentError::DoctorNotAvailable,
    }
}

fn map_slot_error(error: SlotError) -> AppointmentError {
    match error {
        SlotError::NotFound(_) => AppointmentError::SlotNotFound,
        SlotError::Unavailable(_) => AppointmentError::SlotUnavailable,
    }
}

fn map_queue_error(error: QueueError) -> AppointmentError {
    AppointmentError::Queue(error.to_string())
}
