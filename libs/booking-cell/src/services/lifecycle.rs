// libs/booking-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentStatus, BookingError};

/// Central authority over appointment status transitions. Every status
/// change in the cell goes through this table; call sites never re-validate
/// ad hoc.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed.
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {:?} to {:?}", current_status, new_status);

        if !self.valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {:?} -> {:?}", current_status, new_status);
            return Err(BookingError::InvalidStatusTransition(current_status.clone()));
        }

        Ok(())
    }

    /// All valid next statuses for a given current status. Appointments are
    /// created as Confirmed; Completed and Cancelled are terminal.
    pub fn valid_transitions(&self, current_status: &AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => &[],
            AppointmentStatus::Cancelled => &[],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
