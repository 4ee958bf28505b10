use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use appointment_cell::AppointmentWorkflowService;
use notification_cell::{VisibilityError, VisibilityNotifier};
use shared_database::memory::InMemoryRecordStore;
use shared_database::storage::{FileStorage, LocalFileStorage};
use shared_database::store::RecordStore;
use shared_models::records::{AiReport, Appointment, AppointmentStatus, Patient, UserRole, XrayImage};

struct Fixture {
    _dir: TempDir,
    store: Arc<InMemoryRecordStore>,
    files: Arc<LocalFileStorage>,
    workflow: Arc<AppointmentWorkflowService>,
    notifier: VisibilityNotifier,
    patient_id: Uuid,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemoryRecordStore::new());
    let files = Arc::new(LocalFileStorage::new(dir.path()));
    let patient_id = Uuid::new_v4();
    store
        .insert_patient(Patient {
            id: patient_id,
            user_id: Uuid::new_v4(),
            full_name: "Lim Wei Jie".to_string(),
            ic_number: None,
            date_of_birth: None,
            gender: None,
            address: None,
        })
        .await;

    let workflow = Arc::new(AppointmentWorkflowService::new(store.clone()));
    let notifier = VisibilityNotifier::new(store.clone(), files.clone(), workflow.clone());

    Fixture {
        _dir: dir,
        store,
        files,
        workflow,
        notifier,
        patient_id,
    }
}

async fn uploaded_report(f: &Fixture) -> (Appointment, AiReport) {
    let appointment = f.workflow.book(f.patient_id, "2025-04-02", "10:30").await.unwrap();
    f.workflow
        .transition(appointment.id, AppointmentStatus::Approved, UserRole::Nurse)
        .await
        .unwrap();
    f.workflow
        .transition(appointment.id, AppointmentStatus::Completed, UserRole::Nurse)
        .await
        .unwrap();

    let image = XrayImage {
        id: Uuid::new_v4(),
        appointment_id: appointment.id,
        uploaded_by: Uuid::new_v4(),
        image_path: "uploads/scan.png".to_string(),
        upload_date: Utc::now(),
    };
    let report = AiReport {
        id: Uuid::new_v4(),
        image_id: image.id,
        prediction: "PNEUMONIA".to_string(),
        confidence_score: 0.93,
        generated_at: Utc::now(),
        is_visible: false,
    };
    f.store.commit_ingestion(&image, &report).await.unwrap();
    (appointment, report)
}

#[tokio::test]
async fn test_release_is_idempotent() {
    let f = fixture().await;
    let (appointment, report) = uploaded_report(&f).await;

    assert!(f.notifier.visible_reports_for(appointment.id).await.unwrap().is_empty());

    f.notifier.release(report.id).await.unwrap();
    let after_first = f.notifier.visible_reports_for(appointment.id).await.unwrap();

    f.notifier.release(report.id).await.unwrap();
    let after_second = f.notifier.visible_reports_for(appointment.id).await.unwrap();

    assert_eq!(after_first.len(), 1);
    assert!(after_first[0].is_visible);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_release_unknown_report() {
    let f = fixture().await;

    assert_matches!(
        f.notifier.release(Uuid::new_v4()).await,
        Err(VisibilityError::ReportNotFound(_))
    );
}

#[tokio::test]
async fn test_badge_counts_only_unseen_approvals() {
    let f = fixture().await;

    let approved = f.workflow.book(f.patient_id, "2025-04-02", "09:00").await.unwrap();
    f.workflow
        .transition(approved.id, AppointmentStatus::Approved, UserRole::Nurse)
        .await
        .unwrap();

    let rejected = f.workflow.book(f.patient_id, "2025-04-03", "09:00").await.unwrap();
    f.workflow
        .transition(rejected.id, AppointmentStatus::Rejected, UserRole::Nurse)
        .await
        .unwrap();

    f.workflow.book(f.patient_id, "2025-04-04", "09:00").await.unwrap();

    assert_eq!(f.notifier.pending_notification_count(f.patient_id).await.unwrap(), 1);
    let pending = f.notifier.pending_notifications(f.patient_id).await.unwrap();
    assert_eq!(pending[0].id, approved.id);

    f.notifier.acknowledge(&[approved.id]).await.unwrap();
    assert_eq!(f.notifier.pending_notification_count(f.patient_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_acknowledge_empty_never_mutates() {
    let f = fixture().await;
    let appointment = f.workflow.book(f.patient_id, "2025-04-02", "09:00").await.unwrap();

    assert_eq!(f.notifier.acknowledge(&[]).await.unwrap(), 0);
    assert_eq!(f.notifier.acknowledge_for_patient(f.patient_id, &[]).await.unwrap(), 0);

    assert!(!f.workflow.get(appointment.id).await.unwrap().is_seen);
}

#[tokio::test]
async fn test_acknowledge_for_patient_skips_foreign_ids() {
    let f = fixture().await;
    let own = f.workflow.book(f.patient_id, "2025-04-02", "09:00").await.unwrap();

    let other_patient = Uuid::new_v4();
    f.store
        .insert_patient(Patient {
            id: other_patient,
            user_id: Uuid::new_v4(),
            full_name: "Other".to_string(),
            ic_number: None,
            date_of_birth: None,
            gender: None,
            address: None,
        })
        .await;
    let foreign = f.workflow.book(other_patient, "2025-04-02", "11:00").await.unwrap();

    let count = f
        .notifier
        .acknowledge_for_patient(f.patient_id, &[own.id, foreign.id])
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert!(f.workflow.get(own.id).await.unwrap().is_seen);
    assert!(!f.workflow.get(foreign.id).await.unwrap().is_seen);
}

#[tokio::test]
async fn test_patient_views_recheck_report_file() {
    let f = fixture().await;
    let (appointment, report) = uploaded_report(&f).await;
    f.notifier.release(report.id).await.unwrap();

    let path = format!("reports/{}_1_summary.pdf", report.id);
    f.files.put(&path, b"pdf").await.unwrap();
    f.store
        .set_report_file_path(report.id, Uuid::new_v4(), Some(&path))
        .await
        .unwrap();

    let views = f.notifier.patient_report_views(appointment.id).await.unwrap();
    assert_eq!(views.len(), 1);
    assert!(views[0].report_file_available);
    assert_eq!(views[0].interpretation.recommendation, "Strong indication of pneumonia. Recommend immediate medical attention.");

    f.files.delete(&path).await.unwrap();
    let views = f.notifier.patient_report_views(appointment.id).await.unwrap();
    assert!(!views[0].report_file_available);
}
