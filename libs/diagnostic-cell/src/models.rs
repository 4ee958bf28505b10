// libs/diagnostic-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use classifier_cell::{ClassifierError, Interpretation};
use shared_database::storage::StorageError;
use shared_database::store::StoreError;
use shared_models::error::AppError;
use shared_models::records::{AiReport, AppointmentStatus, DoctorDiagnosis, XrayImage};

/// Diagnosis label recorded when a doctor signs off on a report.
pub const FINAL_DIAGNOSIS: &str = "FINAL_DIAGNOSIS";

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadXrayRequest {
    pub file_name: String,
    /// Standard base64 of the image bytes.
    pub image_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDiagnosisRequest {
    pub comments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFileUpload {
    pub file_name: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionResponse {
    pub report: AiReport,
    pub interpretation: Interpretation,
}

/// One row of the doctor's all-reports view.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueueEntry {
    pub report: AiReport,
    pub image: Option<XrayImage>,
    pub diagnosis: Option<DoctorDiagnosis>,
    pub interpretation: Interpretation,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Appointment {appointment_id} is {status}; X-rays are accepted only after the appointment is completed")]
    InvalidState {
        appointment_id: Uuid,
        status: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(#[from] ClassifierError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(StoreError),
}

impl PipelineError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        PipelineError::NotFound { entity, id }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => PipelineError::NotFound { entity, id },
            StoreError::StatusConflict { appointment_id, actual } => PipelineError::InvalidState {
                appointment_id,
                status: actual,
            },
            other => PipelineError::Store(other),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound { .. } => AppError::NotFound(err.to_string()),
            PipelineError::InvalidState { .. } => AppError::Conflict(err.to_string()),
            PipelineError::ValidationError(msg) => AppError::ValidationError(msg),
            PipelineError::ClassificationUnavailable(e) => e.into(),
            PipelineError::Storage(e) => AppError::Internal(e.to_string()),
            PipelineError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
