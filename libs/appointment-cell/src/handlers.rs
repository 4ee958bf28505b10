// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::records::{AppointmentStatus, UserRole};
use shared_utils::extractor::require_role;

use crate::models::{
    AppointmentStatusQuery, AppointmentWithTransitions, BookAppointmentRequest, TransitionRequest,
};
use crate::services::workflow::AppointmentWorkflowService;

const STAFF: &[UserRole] = &[UserRole::Nurse, UserRole::Doctor, UserRole::Admin];

/// Resolves which patient a caller may act for. Patients are pinned to their
/// own profile; staff must name the patient.
async fn resolve_patient(
    service: &AppointmentWorkflowService,
    user: &User,
    requested: Option<Uuid>,
) -> Result<Uuid, AppError> {
    if user.role == UserRole::Patient {
        let patient = service
            .patient_for_user(user.id)
            .await?
            .ok_or_else(|| AppError::Forbidden("No patient profile for this account".to_string()))?;

        if requested.is_some_and(|id| id != patient.id) {
            return Err(AppError::Forbidden("Patients may only act on their own appointments".to_string()));
        }
        return Ok(patient.id);
    }

    require_role(user, &[UserRole::Nurse, UserRole::Admin])?;
    requested.ok_or_else(|| AppError::ValidationError("patient_id is required".to_string()))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<AppointmentWorkflowService>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_id = resolve_patient(&service, &user, request.patient_id).await?;

    let appointment = service
        .book(patient_id, &request.appointment_date, &request.appointment_time)
        .await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<AppointmentWorkflowService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.get(appointment_id).await?;

    if !user.is_staff() {
        resolve_patient(&service, &user, Some(appointment.patient_id)).await?;
    }

    let valid_transitions = service.valid_transitions(appointment.status).to_vec();
    Ok(Json(json!(AppointmentWithTransitions {
        appointment,
        valid_transitions,
    })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(service): State<Arc<AppointmentWorkflowService>>,
    Path(patient_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_staff() {
        resolve_patient(&service, &user, Some(patient_id)).await?;
    }

    let appointments = service.appointments_for_patient(patient_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(service): State<Arc<AppointmentWorkflowService>>,
    Query(query): Query<AppointmentStatusQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, STAFF)?;

    let statuses = match query.status.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(|s| s.parse::<AppointmentStatus>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::ValidationError(e.to_string()))?,
        _ => AppointmentStatus::ALL.to_vec(),
    };

    let appointments = service.appointments_with_status(&statuses).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn transition_appointment(
    State(service): State<Arc<AppointmentWorkflowService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let target = request
        .status
        .parse::<AppointmentStatus>()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let appointment = service.transition(appointment_id, target, user.role).await?;

    Ok(Json(json!(appointment)))
}
