// libs/notification-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::WorkflowError;
use classifier_cell::Interpretation;
use shared_database::storage::StorageError;
use shared_database::store::StoreError;
use shared_models::error::AppError;
use shared_models::records::{AiReport, Appointment};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeRequest {
    pub appointment_ids: Vec<Uuid>,
}

/// Released report as shown to the patient.
#[derive(Debug, Clone, Serialize)]
pub struct PatientReportView {
    pub report: AiReport,
    pub interpretation: Interpretation,
    pub diagnosis_comments: Option<String>,
    pub report_file_available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationSummary {
    pub count: usize,
    pub appointments: Vec<Appointment>,
}

#[derive(Error, Debug)]
pub enum VisibilityError {
    #[error("AI report not found: {0}")]
    ReportNotFound(Uuid),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Store(StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<StoreError> for VisibilityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity: "AI report", id } => VisibilityError::ReportNotFound(id),
            other => VisibilityError::Store(other),
        }
    }
}

impl From<VisibilityError> for AppError {
    fn from(err: VisibilityError) -> Self {
        match err {
            VisibilityError::ReportNotFound(_) => AppError::NotFound(err.to_string()),
            VisibilityError::Workflow(e) => e.into(),
            VisibilityError::Store(e) => AppError::Database(e.to_string()),
            VisibilityError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}
