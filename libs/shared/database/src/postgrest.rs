use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::records::{
    AiReport, Appointment, AppointmentStatus, Doctor, DoctorDiagnosis, Nurse, Patient, XrayImage,
};

use crate::store::{RecordStore, StoreError};
use crate::supabase::SupabaseClient;

const APPOINTMENT_ORDER: &str = "order=appointment_date.desc,appointment_time.desc";

/// Outcome reported by the `commit_xray_ingestion` Postgres function.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
enum CommitOutcome {
    Committed,
    NotFound,
    StatusConflict { status: String },
}

/// `RecordStore` over Supabase's PostgREST API.
///
/// Conditional updates are expressed as filtered PATCHes (`status=eq.X`,
/// `is_visible=eq.false`) so the database applies the check and the write in
/// one statement. Ingestion goes through the `commit_xray_ingestion` function
/// (`sql/commit_xray_ingestion.sql`), which locks the appointment row, checks
/// its status, inserts the image and report rows and sets UPLOADED in one
/// transaction.
pub struct SupabaseRecordStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseRecordStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(backend)?;
        decode_rows(rows)
    }

    async fn select_one<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        Ok(self.select(path).await?.into_iter().next())
    }

    async fn insert(&self, table: &str, body: Value) -> Result<Vec<Value>, StoreError> {
        self.supabase
            .write_returning(Method::POST, &format!("/rest/v1/{}", table), body)
            .await
            .map_err(backend)
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Vec<Value>, StoreError> {
        self.supabase
            .write_returning(Method::PATCH, path, body)
            .await
            .map_err(backend)
    }
}

fn backend(err: anyhow::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn decode<T: DeserializeOwned>(row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::Schema(e.to_string()))
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(decode).collect()
}

fn id_list(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
}

fn encode<T: serde::Serialize>(record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Schema(e.to_string()))
}

#[async_trait]
impl RecordStore for SupabaseRecordStore {
    async fn find_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        self.select_one(&format!("/rest/v1/patients?id=eq.{}", patient_id)).await
    }

    async fn find_patient_by_user(&self, user_id: Uuid) -> Result<Option<Patient>, StoreError> {
        self.select_one(&format!("/rest/v1/patients?user_id=eq.{}", user_id)).await
    }

    async fn find_nurse_by_user(&self, user_id: Uuid) -> Result<Option<Nurse>, StoreError> {
        self.select_one(&format!("/rest/v1/nurses?user_id=eq.{}", user_id)).await
    }

    async fn find_doctor_by_user(&self, user_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        self.select_one(&format!("/rest/v1/doctors?user_id=eq.{}", user_id)).await
    }

    async fn create_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let created = self.insert("appointments", encode(appointment)?).await?;
        if created.is_empty() {
            return Err(StoreError::Backend("Failed to create appointment record".to_string()));
        }
        Ok(())
    }

    async fn find_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.select_one(&format!("/rest/v1/appointments?id=eq.{}", appointment_id)).await
    }

    async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        self.select(&format!(
            "/rest/v1/appointments?patient_id=eq.{}&{}",
            patient_id, APPOINTMENT_ORDER
        ))
        .await
    }

    async fn appointments_with_status(
        &self,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let list = statuses.iter().map(AppointmentStatus::as_str).collect::<Vec<_>>().join(",");
        self.select(&format!("/rest/v1/appointments?status=in.({})&{}", list, APPOINTMENT_ORDER))
            .await
    }

    async fn compare_and_set_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<bool, StoreError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id, expected
        );
        let updated = self.patch(&path, json!({ "status": next })).await?;
        if !updated.is_empty() {
            return Ok(true);
        }

        match self.find_appointment(appointment_id).await? {
            Some(current) => {
                debug!(
                    "Status CAS lost for {}: expected {}, found {}",
                    appointment_id, expected, current.status
                );
                Ok(false)
            }
            None => Err(StoreError::not_found("Appointment", appointment_id)),
        }
    }

    async fn mark_appointments_seen(&self, appointment_ids: &[Uuid]) -> Result<usize, StoreError> {
        if appointment_ids.is_empty() {
            return Ok(0);
        }
        let path = format!("/rest/v1/appointments?id=in.({})", id_list(appointment_ids));
        let updated = self.patch(&path, json!({ "is_seen": true })).await?;
        Ok(updated.len())
    }

    async fn commit_ingestion(&self, image: &XrayImage, report: &AiReport) -> Result<(), StoreError> {
        let outcome: CommitOutcome = self
            .supabase
            .rpc(
                "commit_xray_ingestion",
                json!({
                    "p_image": encode(image)?,
                    "p_report": encode(report)?,
                }),
            )
            .await
            .map_err(backend)?;

        match outcome {
            CommitOutcome::Committed => Ok(()),
            CommitOutcome::NotFound => Err(StoreError::not_found("Appointment", image.appointment_id)),
            CommitOutcome::StatusConflict { status } => {
                let actual = status
                    .parse::<AppointmentStatus>()
                    .map_err(|e| StoreError::Schema(e.to_string()))?;
                warn!("Ingestion commit refused for {}: status {}", image.appointment_id, actual);
                Err(StoreError::StatusConflict {
                    appointment_id: image.appointment_id,
                    actual,
                })
            }
        }
    }

    async fn find_image(&self, image_id: Uuid) -> Result<Option<XrayImage>, StoreError> {
        self.select_one(&format!("/rest/v1/xray_images?id=eq.{}", image_id)).await
    }

    async fn images_for_appointment(&self, appointment_id: Uuid) -> Result<Vec<XrayImage>, StoreError> {
        self.select(&format!(
            "/rest/v1/xray_images?appointment_id=eq.{}&order=upload_date.desc",
            appointment_id
        ))
        .await
    }

    async fn find_report(&self, report_id: Uuid) -> Result<Option<AiReport>, StoreError> {
        self.select_one(&format!("/rest/v1/ai_reports?id=eq.{}", report_id)).await
    }

    async fn reports_for_appointment(&self, appointment_id: Uuid) -> Result<Vec<AiReport>, StoreError> {
        // Inner join through xray_images; the embedded object is ignored on decode.
        self.select(&format!(
            "/rest/v1/ai_reports?select=*,xray_images!inner(appointment_id)&xray_images.appointment_id=eq.{}&order=generated_at.desc",
            appointment_id
        ))
        .await
    }

    async fn all_reports(&self) -> Result<Vec<AiReport>, StoreError> {
        self.select("/rest/v1/ai_reports?order=generated_at.desc").await
    }

    async fn mark_report_visible(&self, report_id: Uuid) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/ai_reports?id=eq.{}&is_visible=eq.false", report_id);
        let updated = self.patch(&path, json!({ "is_visible": true })).await?;
        if !updated.is_empty() {
            return Ok(true);
        }

        match self.find_report(report_id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::not_found("AI report", report_id)),
        }
    }

    async fn find_diagnosis(&self, report_id: Uuid) -> Result<Option<DoctorDiagnosis>, StoreError> {
        self.select_one(&format!(
            "/rest/v1/doctor_diagnosis?report_id=eq.{}&order=diagnosis_date.desc&limit=1",
            report_id
        ))
        .await
    }

    async fn upsert_diagnosis(&self, diagnosis: &DoctorDiagnosis) -> Result<DoctorDiagnosis, StoreError> {
        if let Some(existing) = self.find_diagnosis(diagnosis.report_id).await? {
            let path = format!("/rest/v1/doctor_diagnosis?id=eq.{}", existing.id);
            let updated = self
                .patch(
                    &path,
                    json!({
                        "doctor_id": diagnosis.doctor_id,
                        "diagnosis_result": diagnosis.diagnosis_result,
                        "comments": diagnosis.comments,
                        "diagnosis_date": diagnosis.diagnosis_date,
                    }),
                )
                .await?;
            return updated
                .into_iter()
                .next()
                .map(decode)
                .unwrap_or_else(|| Err(StoreError::not_found("Doctor diagnosis", existing.id)));
        }

        let created = self.insert("doctor_diagnosis", encode(diagnosis)?).await?;
        created
            .into_iter()
            .next()
            .map(decode)
            .unwrap_or_else(|| Err(StoreError::Backend("Failed to create diagnosis record".to_string())))
    }

    async fn set_report_file_path(
        &self,
        report_id: Uuid,
        doctor_id: Uuid,
        path: Option<&str>,
    ) -> Result<DoctorDiagnosis, StoreError> {
        if let Some(existing) = self.find_diagnosis(report_id).await? {
            let update_path = format!("/rest/v1/doctor_diagnosis?id=eq.{}", existing.id);
            let updated = self.patch(&update_path, json!({ "report_file_path": path })).await?;
            return updated
                .into_iter()
                .next()
                .map(decode)
                .unwrap_or_else(|| Err(StoreError::not_found("Doctor diagnosis", existing.id)));
        }

        let Some(path) = path else {
            return Err(StoreError::not_found("Doctor diagnosis", report_id));
        };

        let diagnosis = DoctorDiagnosis {
            id: Uuid::new_v4(),
            report_id,
            doctor_id,
            diagnosis_result: None,
            comments: None,
            diagnosis_date: Utc::now(),
            report_file_path: Some(path.to_string()),
        };
        let created = self.insert("doctor_diagnosis", encode(&diagnosis)?).await?;
        created
            .into_iter()
            .next()
            .map(decode)
            .unwrap_or_else(|| Err(StoreError::Backend("Failed to create diagnosis record".to_string())))
    }
}
