// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::records::{AppointmentStatus, UserRole};

use crate::models::WorkflowError;

/// Transition table for appointments. UPLOADED is reachable only through the
/// diagnostic pipeline, never through this table.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), WorkflowError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Pending => &[AppointmentStatus::Approved, AppointmentStatus::Rejected],
            AppointmentStatus::Approved => &[AppointmentStatus::Completed],
            // Terminal for manual transitions
            AppointmentStatus::Rejected | AppointmentStatus::Completed | AppointmentStatus::Uploaded => &[],
        }
    }

    /// Nurses review appointments; admins may act on their behalf.
    pub fn validate_actor(&self, role: UserRole) -> Result<(), WorkflowError> {
        match role {
            UserRole::Nurse | UserRole::Admin => Ok(()),
            _ => Err(WorkflowError::Unauthorized { role }),
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
