use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared_models::records::{
    AiReport, Appointment, AppointmentStatus, Doctor, DoctorDiagnosis, Nurse, Patient, XrayImage,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Appointment {appointment_id} is {actual}, which does not accept this write")]
    StatusConflict {
        appointment_id: Uuid,
        actual: AppointmentStatus,
    },

    /// A stored row did not match the expected shape (unknown enum value, missing column).
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { entity, id }
    }
}

/// Durable storage for every workflow record.
///
/// Each method is one unit of work against the backing store. Conditional
/// writes (`compare_and_set_status`, `mark_report_visible`, `commit_ingestion`)
/// are evaluated and applied atomically by the implementation; callers never
/// hold a lock across calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, StoreError>;

    async fn find_patient_by_user(&self, user_id: Uuid) -> Result<Option<Patient>, StoreError>;

    async fn find_nurse_by_user(&self, user_id: Uuid) -> Result<Option<Nurse>, StoreError>;

    async fn find_doctor_by_user(&self, user_id: Uuid) -> Result<Option<Doctor>, StoreError>;

    async fn create_appointment(&self, appointment: &Appointment) -> Result<(), StoreError>;

    async fn find_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Newest appointment date first, then newest time.
    async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError>;

    async fn appointments_with_status(
        &self,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Sets `next` only if the stored status still equals `expected`.
    /// Returns `Ok(false)` when the status moved underneath the caller.
    async fn compare_and_set_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<bool, StoreError>;

    /// Sets `is_seen` on every listed appointment that exists. Returns how many rows matched.
    async fn mark_appointments_seen(&self, appointment_ids: &[Uuid]) -> Result<usize, StoreError>;

    /// Inserts the image and its report and moves the appointment to UPLOADED,
    /// all or nothing. Fails with `StatusConflict` unless the appointment
    /// currently accepts an X-ray.
    async fn commit_ingestion(&self, image: &XrayImage, report: &AiReport) -> Result<(), StoreError>;

    async fn find_image(&self, image_id: Uuid) -> Result<Option<XrayImage>, StoreError>;

    /// Newest upload first.
    async fn images_for_appointment(&self, appointment_id: Uuid) -> Result<Vec<XrayImage>, StoreError>;

    async fn find_report(&self, report_id: Uuid) -> Result<Option<AiReport>, StoreError>;

    /// Newest `generated_at` first.
    async fn reports_for_appointment(&self, appointment_id: Uuid) -> Result<Vec<AiReport>, StoreError>;

    /// Newest `generated_at` first.
    async fn all_reports(&self) -> Result<Vec<AiReport>, StoreError>;

    /// Returns `Ok(true)` if the flag flipped, `Ok(false)` if it was already set.
    async fn mark_report_visible(&self, report_id: Uuid) -> Result<bool, StoreError>;

    /// Latest diagnosis for the report, if any.
    async fn find_diagnosis(&self, report_id: Uuid) -> Result<Option<DoctorDiagnosis>, StoreError>;

    /// Updates the existing diagnosis of `diagnosis.report_id` in place (keeping
    /// its id and attached file) or inserts `diagnosis` when none exists.
    async fn upsert_diagnosis(&self, diagnosis: &DoctorDiagnosis) -> Result<DoctorDiagnosis, StoreError>;

    /// Sets or clears the attached report file. Creates a diagnosis row owned by
    /// `doctor_id` when attaching to a report that has none.
    async fn set_report_file_path(
        &self,
        report_id: Uuid,
        doctor_id: Uuid,
        path: Option<&str>,
    ) -> Result<DoctorDiagnosis, StoreError>;
}
