// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::AppointmentStatus;

use crate::models::AppointmentError;

/// Owns the appointment status transition table. Every status change in
/// the system passes through `validate_transition` before it is applied.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_transition(
        &self,
        current: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, next);

        if !self.valid_transitions(current).contains(&next) {
            warn!("Invalid status transition attempted: {} -> {}", current, next);
            return Err(AppointmentError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        Ok(())
    }

    /// All statuses reachable in one step from the given one. Terminal
    /// statuses return an empty list.
    pub fn valid_transitions(&self, current: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Booked,
                AppointmentStatus::Rejected,
            ],
            AppointmentStatus::Booked => vec![
                AppointmentStatus::CheckedIn,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::CheckedIn => vec![
                AppointmentStatus::InConsultation,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::InConsultation => vec![AppointmentStatus::Completed],
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::Rejected => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn pending_can_be_booked_or_rejected() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_transition(AppointmentStatus::Pending, AppointmentStatus::Booked)
            .is_ok());
        assert!(lifecycle
            .validate_transition(AppointmentStatus::Pending, AppointmentStatus::Rejected)
            .is_ok());
    }

    #[test]
    fn pending_cannot_jump_to_consultation() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_matches!(
            lifecycle.validate_transition(
                AppointmentStatus::Pending,
                AppointmentStatus::InConsultation
            ),
            Err(AppointmentError::InvalidTransition {
                from: AppointmentStatus::Pending,
                to: AppointmentStatus::InConsultation,
            })
        );
    }

    #[test]
    fn consultation_only_completes() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_eq!(
            lifecycle.valid_transitions(AppointmentStatus::InConsultation),
            vec![AppointmentStatus::Completed]
        );
        assert_matches!(
            lifecycle.validate_transition(
                AppointmentStatus::InConsultation,
                AppointmentStatus::Cancelled
            ),
            Err(AppointmentError::InvalidTransition { .. })
        );
    }

    #[test]
    fn terminal_statuses_admit_nothing() {
        let lifecycle = AppointmentLifecycleService::new();
        for terminal in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Rejected,
        ] {
            assert!(lifecycle.valid_transitions(terminal).is_empty());
            assert_matches!(
                lifecycle.validate_transition(terminal, AppointmentStatus::Pending),
                Err(AppointmentError::InvalidTransition { .. })
            );
        }
    }
}
