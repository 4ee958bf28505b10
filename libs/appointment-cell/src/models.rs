// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::store::StoreError;
use shared_models::error::AppError;
use shared_models::records::{Appointment, AppointmentStatus, UserRole};

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

/// Booking input. Date and time stay as text so malformed values surface as
/// validation errors rather than extractor rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    /// Required when staff book on a patient's behalf; ignored for patients.
    pub patient_id: Option<Uuid>,
    /// `YYYY-MM-DD`
    pub appointment_date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub appointment_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentStatusQuery {
    /// Comma separated, e.g. `PENDING,APPROVED`. All statuses when absent.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentWithTransitions {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub valid_transitions: Vec<AppointmentStatus>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Role {role} may not change appointment status")]
    Unauthorized { role: UserRole },

    #[error("Appointment {0} kept changing while updating its status")]
    Contention(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound(_) => AppError::NotFound(err.to_string()),
            WorkflowError::ValidationError(msg) => AppError::ValidationError(msg),
            WorkflowError::InvalidTransition { .. } | WorkflowError::Contention(_) => {
                AppError::Conflict(err.to_string())
            }
            WorkflowError::Unauthorized { .. } => AppError::Forbidden(err.to_string()),
            WorkflowError::Store(StoreError::NotFound { .. }) => AppError::NotFound(err.to_string()),
            WorkflowError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
