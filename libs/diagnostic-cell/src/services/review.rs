// libs/diagnostic-cell/src/services/review.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use classifier_cell::interpret;
use shared_database::storage::{storage_key, FileStorage, StorageError};
use shared_database::store::RecordStore;
use shared_models::records::{AiReport, Appointment, Doctor, DoctorDiagnosis, Nurse, XrayImage};

use crate::models::{PipelineError, ReviewQueueEntry, FINAL_DIAGNOSIS};

/// Doctor-side work on generated reports: diagnosis comments and the attached
/// e-report document.
pub struct PhysicianReviewService {
    store: Arc<dyn RecordStore>,
    files: Arc<dyn FileStorage>,
}

impl PhysicianReviewService {
    pub fn new(store: Arc<dyn RecordStore>, files: Arc<dyn FileStorage>) -> Self {
        Self { store, files }
    }

    /// Records the doctor's comments against the appointment's latest report.
    #[instrument(skip(self, comments))]
    pub async fn submit_diagnosis(
        &self,
        appointment_id: Uuid,
        doctor_id: Uuid,
        comments: &str,
    ) -> Result<DoctorDiagnosis, PipelineError> {
        let comments = comments.trim();
        if comments.is_empty() {
            return Err(PipelineError::ValidationError("Diagnosis comments are required".to_string()));
        }

        let report = self
            .store
            .reports_for_appointment(appointment_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::not_found("AI report for appointment", appointment_id))?;

        let diagnosis = DoctorDiagnosis {
            id: Uuid::new_v4(),
            report_id: report.id,
            doctor_id,
            diagnosis_result: Some(FINAL_DIAGNOSIS.to_string()),
            comments: Some(comments.to_string()),
            diagnosis_date: Utc::now(),
            report_file_path: None,
        };

        let saved = self.store.upsert_diagnosis(&diagnosis).await?;
        info!("Diagnosis {} saved for report {}", saved.id, report.id);
        Ok(saved)
    }

    /// Stores an e-report document for the report, replacing any earlier one.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn attach_report_file(
        &self,
        report_id: Uuid,
        doctor_id: Uuid,
        file_name: &str,
        content: &[u8],
    ) -> Result<DoctorDiagnosis, PipelineError> {
        if content.is_empty() {
            return Err(PipelineError::ValidationError("Report file is empty".to_string()));
        }
        self.require_report(report_id).await?;

        let previous_path = self
            .store
            .find_diagnosis(report_id)
            .await?
            .and_then(|d| d.report_file_path);

        let path = storage_key("reports", report_id, Uuid::new_v4(), file_name);
        self.files.put(&path, content).await?;

        let diagnosis = match self.store.set_report_file_path(report_id, doctor_id, Some(&path)).await {
            Ok(diagnosis) => diagnosis,
            Err(e) => {
                warn!("Failed to record report file for {}: {}", report_id, e);
                if let Err(cleanup) = self.files.delete(&path).await {
                    warn!("Failed to remove orphaned report file {}: {}", path, cleanup);
                }
                return Err(e.into());
            }
        };

        if let Some(old) = previous_path.filter(|old| *old != path) {
            if let Err(e) = self.files.delete(&old).await {
                warn!("Failed to remove replaced report file {}: {}", old, e);
            }
        }

        info!("Attached report file {} to report {}", path, report_id);
        Ok(diagnosis)
    }

    /// Deletes the attached document (a file already gone is fine) and clears its path.
    #[instrument(skip(self))]
    pub async fn remove_report_file(&self, report_id: Uuid) -> Result<DoctorDiagnosis, PipelineError> {
        let diagnosis = self
            .store
            .find_diagnosis(report_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("Doctor diagnosis", report_id))?;

        if let Some(path) = diagnosis.report_file_path.as_deref() {
            if !self.files.delete(path).await? {
                debug!("Report file {} was already missing", path);
            }
        }

        Ok(self
            .store
            .set_report_file_path(report_id, diagnosis.doctor_id, None)
            .await?)
    }

    /// The attached document, only when a path is recorded and the file is
    /// still present.
    pub async fn report_file(&self, report_id: Uuid) -> Result<Option<Vec<u8>>, PipelineError> {
        self.require_report(report_id).await?;

        let Some(path) = self
            .store
            .find_diagnosis(report_id)
            .await?
            .and_then(|d| d.report_file_path)
            .filter(|p| !p.is_empty())
        else {
            return Ok(None);
        };

        match self.files.get(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StorageError::NotFound(_)) => {
                warn!("Report file {} recorded for {} is missing", path, report_id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every report with its image and diagnosis, newest first.
    pub async fn review_queue(&self) -> Result<Vec<ReviewQueueEntry>, PipelineError> {
        let reports = self.store.all_reports().await?;
        let mut entries = Vec::with_capacity(reports.len());

        for report in reports {
            let image = self.store.find_image(report.image_id).await?;
            let diagnosis = self.store.find_diagnosis(report.id).await?;
            let interpretation = interpret(&report.prediction, report.confidence_score);
            entries.push(ReviewQueueEntry {
                report,
                image,
                diagnosis,
                interpretation,
            });
        }

        Ok(entries)
    }

    /// Report together with the image and appointment it belongs to.
    pub async fn report_context(
        &self,
        report_id: Uuid,
    ) -> Result<(AiReport, XrayImage, Appointment), PipelineError> {
        let report = self.require_report(report_id).await?;
        let image = self
            .store
            .find_image(report.image_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("X-ray image", report.image_id))?;
        let appointment = self
            .store
            .find_appointment(image.appointment_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("Appointment", image.appointment_id))?;
        Ok((report, image, appointment))
    }

    pub async fn doctor_for_user(&self, user_id: Uuid) -> Result<Option<Doctor>, PipelineError> {
        Ok(self.store.find_doctor_by_user(user_id).await?)
    }

    pub async fn nurse_for_user(&self, user_id: Uuid) -> Result<Option<Nurse>, PipelineError> {
        Ok(self.store.find_nurse_by_user(user_id).await?)
    }

    pub async fn patient_id_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, PipelineError> {
        Ok(self.store.find_patient_by_user(user_id).await?.map(|p| p.id))
    }

    async fn require_report(&self, report_id: Uuid) -> Result<AiReport, PipelineError> {
        self.store
            .find_report(report_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("AI report", report_id))
    }
}
