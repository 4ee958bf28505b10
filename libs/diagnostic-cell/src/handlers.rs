// libs/diagnostic-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use uuid::Uuid;

use classifier_cell::interpret;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::records::UserRole;
use shared_utils::extractor::require_role;

use crate::models::{IngestionResponse, ReportFileUpload, SubmitDiagnosisRequest, UploadXrayRequest};
use crate::router::DiagnosticState;

fn decode_base64(field: &str, raw: &str) -> Result<Vec<u8>, AppError> {
    STANDARD
        .decode(raw.trim())
        .map_err(|e| AppError::ValidationError(format!("{} is not valid base64: {}", field, e)))
}

async fn doctor_id(state: &DiagnosticState, user: &User) -> Result<Uuid, AppError> {
    require_role(user, &[UserRole::Doctor])?;
    state
        .review
        .doctor_for_user(user.id)
        .await?
        .map(|d| d.id)
        .ok_or_else(|| AppError::Forbidden("No doctor profile for this account".to_string()))
}

#[axum::debug_handler]
pub async fn upload_xray(
    State(state): State<DiagnosticState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UploadXrayRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&user, &[UserRole::Nurse])?;
    let nurse = state
        .review
        .nurse_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::Forbidden("No nurse profile for this account".to_string()))?;

    let image = decode_base64("image_base64", &request.image_base64)?;

    let report = state
        .pipeline
        .ingest(appointment_id, &image, &request.file_name, nurse.id)
        .await?;
    let interpretation = interpret(&report.prediction, report.confidence_score);

    Ok((
        StatusCode::CREATED,
        Json(json!(IngestionResponse { report, interpretation })),
    ))
}

#[axum::debug_handler]
pub async fn list_reports(
    State(state): State<DiagnosticState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[UserRole::Doctor, UserRole::Admin])?;

    let entries = state.review.review_queue().await?;

    Ok(Json(json!({
        "reports": entries,
        "total": entries.len(),
    })))
}

#[axum::debug_handler]
pub async fn submit_diagnosis(
    State(state): State<DiagnosticState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<SubmitDiagnosisRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = doctor_id(&state, &user).await?;

    let diagnosis = state
        .review
        .submit_diagnosis(appointment_id, doctor_id, &request.comments)
        .await?;

    Ok(Json(json!(diagnosis)))
}

#[axum::debug_handler]
pub async fn attach_report_file(
    State(state): State<DiagnosticState>,
    Path(report_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(upload): Json<ReportFileUpload>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = doctor_id(&state, &user).await?;
    let content = decode_base64("content_base64", &upload.content_base64)?;

    let diagnosis = state
        .review
        .attach_report_file(report_id, doctor_id, &upload.file_name, &content)
        .await?;

    Ok(Json(json!(diagnosis)))
}

#[axum::debug_handler]
pub async fn remove_report_file(
    State(state): State<DiagnosticState>,
    Path(report_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    doctor_id(&state, &user).await?;

    let diagnosis = state.review.remove_report_file(report_id).await?;

    Ok(Json(json!(diagnosis)))
}

/// Staff may fetch any e-report; patients only their own, once released.
#[axum::debug_handler]
pub async fn download_report_file(
    State(state): State<DiagnosticState>,
    Path(report_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    if !user.is_staff() {
        let (report, _, appointment) = state.review.report_context(report_id).await?;
        let own = state.review.patient_id_for_user(user.id).await? == Some(appointment.patient_id);
        if !own || !report.is_visible {
            return Err(AppError::Forbidden("Report is not available to this account".to_string()));
        }
    }

    let bytes = state
        .review
        .report_file(report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No report file for {}", report_id)))?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}
