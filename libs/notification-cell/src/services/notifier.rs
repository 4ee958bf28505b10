// libs/notification-cell/src/services/notifier.rs
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use appointment_cell::AppointmentWorkflowService;
use shared_database::storage::FileStorage;
use shared_database::store::RecordStore;
use shared_models::records::{AiReport, Appointment};

use crate::models::{PatientReportView, VisibilityError};
use crate::services::report_view::build_report_view;

/// Releases reports to patients and tracks which approvals a patient has seen.
pub struct VisibilityNotifier {
    store: Arc<dyn RecordStore>,
    files: Arc<dyn FileStorage>,
    workflow: Arc<AppointmentWorkflowService>,
}

impl VisibilityNotifier {
    pub fn new(
        store: Arc<dyn RecordStore>,
        files: Arc<dyn FileStorage>,
        workflow: Arc<AppointmentWorkflowService>,
    ) -> Self {
        Self { store, files, workflow }
    }

    /// Makes a report visible to its patient. Releasing twice is a no-op.
    #[instrument(skip(self))]
    pub async fn release(&self, report_id: Uuid) -> Result<(), VisibilityError> {
        if self.store.mark_report_visible(report_id).await? {
            info!("Report {} released to patient", report_id);
        } else {
            debug!("Report {} was already visible", report_id);
        }
        Ok(())
    }

    /// Released reports for an appointment, newest first.
    pub async fn visible_reports_for(&self, appointment_id: Uuid) -> Result<Vec<AiReport>, VisibilityError> {
        Ok(self
            .store
            .reports_for_appointment(appointment_id)
            .await?
            .into_iter()
            .filter(|report| report.is_visible)
            .collect())
    }

    /// Unseen approvals, the only appointment changes a patient is notified about.
    pub async fn pending_notifications(&self, patient_id: Uuid) -> Result<Vec<Appointment>, VisibilityError> {
        Ok(self
            .workflow
            .appointments_for_patient(patient_id)
            .await?
            .into_iter()
            .filter(Appointment::is_pending_notification)
            .collect())
    }

    pub async fn pending_notification_count(&self, patient_id: Uuid) -> Result<usize, VisibilityError> {
        Ok(self.pending_notifications(patient_id).await?.len())
    }

    /// Marks the given appointments as seen. Safe to call with an empty list.
    pub async fn acknowledge(&self, appointment_ids: &[Uuid]) -> Result<usize, VisibilityError> {
        Ok(self.workflow.mark_seen(appointment_ids).await?)
    }

    /// Acknowledges only the ids that belong to `patient_id`.
    pub async fn acknowledge_for_patient(
        &self,
        patient_id: Uuid,
        appointment_ids: &[Uuid],
    ) -> Result<usize, VisibilityError> {
        if appointment_ids.is_empty() {
            return Ok(0);
        }

        let own: HashSet<Uuid> = self
            .workflow
            .appointments_for_patient(patient_id)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        let ids: Vec<Uuid> = appointment_ids.iter().copied().filter(|id| own.contains(id)).collect();

        self.acknowledge(&ids).await
    }

    /// Released reports with interpretation, doctor comments and whether the
    /// e-report file can currently be downloaded.
    pub async fn patient_report_views(
        &self,
        appointment_id: Uuid,
    ) -> Result<Vec<PatientReportView>, VisibilityError> {
        let reports = self.visible_reports_for(appointment_id).await?;
        let mut views = Vec::with_capacity(reports.len());

        for report in reports {
            let diagnosis = self.store.find_diagnosis(report.id).await?;
            let report_file_available = match diagnosis
                .as_ref()
                .and_then(|d| d.report_file_path.as_deref())
                .filter(|p| !p.is_empty())
            {
                Some(path) => self.files.exists(path).await?,
                None => false,
            };
            views.push(build_report_view(report, diagnosis, report_file_available));
        }

        Ok(views)
    }

    pub async fn appointment(&self, appointment_id: Uuid) -> Result<Appointment, VisibilityError> {
        Ok(self.workflow.get(appointment_id).await?)
    }

    pub async fn patient_id_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, VisibilityError> {
        Ok(self.workflow.patient_for_user(user_id).await?.map(|p| p.id))
    }
}
