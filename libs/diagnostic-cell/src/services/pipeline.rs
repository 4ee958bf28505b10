// libs/diagnostic-cell/src/services/pipeline.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use classifier_cell::Classifier;
use shared_database::storage::{storage_key, FileStorage};
use shared_database::store::RecordStore;
use shared_models::records::{AiReport, XrayImage};

use crate::models::PipelineError;

/// X-ray ingestion: store bytes, classify, then commit image, report and the
/// UPLOADED status together.
///
/// Nothing is written to the record store before the final commit, so a
/// failed classification or a lost race leaves no rows behind. The stored
/// bytes are deleted on every failure path after they were written.
pub struct DiagnosticPipeline {
    store: Arc<dyn RecordStore>,
    files: Arc<dyn FileStorage>,
    classifier: Arc<dyn Classifier>,
}

impl DiagnosticPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        files: Arc<dyn FileStorage>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            store,
            files,
            classifier,
        }
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn ingest(
        &self,
        appointment_id: Uuid,
        image: &[u8],
        file_name: &str,
        uploaded_by: Uuid,
    ) -> Result<AiReport, PipelineError> {
        if image.is_empty() {
            return Err(PipelineError::ValidationError("X-ray image is empty".to_string()));
        }

        let appointment = self
            .store
            .find_appointment(appointment_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("Appointment", appointment_id))?;

        if !appointment.status.accepts_xray() {
            return Err(PipelineError::InvalidState {
                appointment_id,
                status: appointment.status,
            });
        }

        let image_id = Uuid::new_v4();
        let image_path = storage_key("uploads", appointment_id, image_id, file_name);
        self.files.put(&image_path, image).await?;

        let classification = match self.classifier.classify(image, file_name).await {
            Ok(classification) => classification,
            Err(e) => {
                error!(
                    payload = e.raw_payload().unwrap_or(""),
                    "Classification failed for appointment {}: {}", appointment_id, e
                );
                self.discard(&image_path).await;
                return Err(PipelineError::ClassificationUnavailable(e));
            }
        };

        let xray = XrayImage {
            id: image_id,
            appointment_id,
            uploaded_by,
            image_path: image_path.clone(),
            upload_date: Utc::now(),
        };
        let report = AiReport {
            id: Uuid::new_v4(),
            image_id: xray.id,
            prediction: classification.prediction,
            confidence_score: classification.confidence_score,
            generated_at: Utc::now(),
            is_visible: false,
        };

        if let Err(e) = self.store.commit_ingestion(&xray, &report).await {
            warn!("Ingestion commit failed for appointment {}: {}", appointment_id, e);
            self.discard(&image_path).await;
            return Err(e.into());
        }

        info!(
            "Ingested X-ray {} for appointment {}: {} ({:.2})",
            xray.id, appointment_id, report.prediction, report.confidence_score
        );
        Ok(report)
    }

    async fn discard(&self, image_path: &str) {
        match self.files.delete(image_path).await {
            Ok(_) => info!("Rolled back stored image {}", image_path),
            Err(e) => error!("Failed to remove stored image {} during rollback: {}", image_path, e),
        }
    }
}
