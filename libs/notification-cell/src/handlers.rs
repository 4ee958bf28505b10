// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::records::UserRole;
use shared_utils::extractor::require_role;

use crate::models::{AcknowledgeRequest, NotificationSummary};
use crate::services::VisibilityNotifier;

async fn own_patient_id(notifier: &VisibilityNotifier, user: &User) -> Result<Uuid, AppError> {
    notifier
        .patient_id_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::Forbidden("No patient profile for this account".to_string()))
}

/// Patients may only read their own records; staff may read any.
async fn authorize_patient(notifier: &VisibilityNotifier, user: &User, patient_id: Uuid) -> Result<(), AppError> {
    if user.is_staff() {
        return Ok(());
    }
    if own_patient_id(notifier, user).await? != patient_id {
        return Err(AppError::Forbidden("Not authorized for this patient".to_string()));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn release_report(
    State(notifier): State<Arc<VisibilityNotifier>>,
    Path(report_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[UserRole::Nurse, UserRole::Doctor, UserRole::Admin])?;

    notifier.release(report_id).await?;

    Ok(Json(json!({
        "report_id": report_id,
        "is_visible": true,
    })))
}

#[axum::debug_handler]
pub async fn appointment_reports(
    State(notifier): State<Arc<VisibilityNotifier>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = notifier.appointment(appointment_id).await?;
    authorize_patient(&notifier, &user, appointment.patient_id).await?;

    let reports = notifier.patient_report_views(appointment_id).await?;

    Ok(Json(json!({
        "appointment_id": appointment_id,
        "reports": reports,
    })))
}

#[axum::debug_handler]
pub async fn patient_notifications(
    State(notifier): State<Arc<VisibilityNotifier>>,
    Path(patient_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize_patient(&notifier, &user, patient_id).await?;

    let appointments = notifier.pending_notifications(patient_id).await?;

    Ok(Json(json!(NotificationSummary {
        count: appointments.len(),
        appointments,
    })))
}

#[axum::debug_handler]
pub async fn acknowledge(
    State(notifier): State<Arc<VisibilityNotifier>>,
    Extension(user): Extension<User>,
    Json(request): Json<AcknowledgeRequest>,
) -> Result<Json<Value>, AppError> {
    let acknowledged = if user.role == UserRole::Patient {
        let patient_id = own_patient_id(&notifier, &user).await?;
        notifier
            .acknowledge_for_patient(patient_id, &request.appointment_ids)
            .await?
    } else {
        require_role(&user, &[UserRole::Nurse, UserRole::Admin])?;
        notifier.acknowledge(&request.appointment_ids).await?
    };

    Ok(Json(json!({ "acknowledged": acknowledged })))
}
