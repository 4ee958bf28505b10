use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::records::{
    AiReport, Appointment, AppointmentStatus, Doctor, DoctorDiagnosis, Nurse, Patient, XrayImage,
};

use crate::store::{RecordStore, StoreError};

#[derive(Default)]
struct Tables {
    patients: HashMap<Uuid, Patient>,
    nurses: HashMap<Uuid, Nurse>,
    doctors: HashMap<Uuid, Doctor>,
    appointments: HashMap<Uuid, Appointment>,
    images: HashMap<Uuid, XrayImage>,
    reports: HashMap<Uuid, AiReport>,
    diagnoses: Vec<DoctorDiagnosis>,
}

impl Tables {
    fn latest_diagnosis_mut(&mut self, report_id: Uuid) -> Option<&mut DoctorDiagnosis> {
        self.diagnoses
            .iter_mut()
            .filter(|d| d.report_id == report_id)
            .max_by_key(|d| d.diagnosis_date)
    }

    fn reports_for(&self, appointment_id: Uuid) -> Vec<AiReport> {
        let mut reports: Vec<AiReport> = self
            .reports
            .values()
            .filter(|report| {
                self.images
                    .get(&report.image_id)
                    .is_some_and(|image| image.appointment_id == appointment_id)
            })
            .cloned()
            .collect();
        sort_reports(&mut reports);
        reports
    }
}

fn sort_reports(reports: &mut [AiReport]) {
    reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
}

fn sort_appointments(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| {
        b.appointment_date
            .cmp(&a.appointment_date)
            .then(b.appointment_time.cmp(&a.appointment_time))
    });
}

/// Process-local record store. Every operation runs inside one critical
/// section of a single `RwLock`, so conditional writes are atomic.
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_patient(&self, patient: Patient) {
        self.tables.write().await.patients.insert(patient.id, patient);
    }

    pub async fn insert_nurse(&self, nurse: Nurse) {
        self.tables.write().await.nurses.insert(nurse.id, nurse);
    }

    pub async fn insert_doctor(&self, doctor: Doctor) {
        self.tables.write().await.doctors.insert(doctor.id, doctor);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        Ok(self.tables.read().await.patients.get(&patient_id).cloned())
    }

    async fn find_patient_by_user(&self, user_id: Uuid) -> Result<Option<Patient>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.patients.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn find_nurse_by_user(&self, user_id: Uuid) -> Result<Option<Nurse>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.nurses.values().find(|n| n.user_id == user_id).cloned())
    }

    async fn find_doctor_by_user(&self, user_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.values().find(|d| d.user_id == user_id).cloned())
    }

    async fn create_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn find_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.tables.read().await.appointments.get(&appointment_id).cloned())
    }

    async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        sort_appointments(&mut appointments);
        Ok(appointments)
    }

    async fn appointments_with_status(
        &self,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| statuses.contains(&a.status))
            .cloned()
            .collect();
        sort_appointments(&mut appointments);
        Ok(appointments)
    }

    async fn compare_and_set_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let appointment = tables
            .appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| StoreError::not_found("Appointment", appointment_id))?;

        if appointment.status != expected {
            debug!(
                "Status CAS lost for {}: expected {}, found {}",
                appointment_id, expected, appointment.status
            );
            return Ok(false);
        }

        appointment.status = next;
        Ok(true)
    }

    async fn mark_appointments_seen(&self, appointment_ids: &[Uuid]) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let mut matched = 0;
        for id in appointment_ids {
            if let Some(appointment) = tables.appointments.get_mut(id) {
                appointment.is_seen = true;
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn commit_ingestion(&self, image: &XrayImage, report: &AiReport) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let appointment = tables
            .appointments
            .get_mut(&image.appointment_id)
            .ok_or_else(|| StoreError::not_found("Appointment", image.appointment_id))?;

        if !appointment.status.accepts_xray() {
            return Err(StoreError::StatusConflict {
                appointment_id: appointment.id,
                actual: appointment.status,
            });
        }

        appointment.status = AppointmentStatus::Uploaded;
        tables.images.insert(image.id, image.clone());
        tables.reports.insert(report.id, report.clone());
        Ok(())
    }

    async fn find_image(&self, image_id: Uuid) -> Result<Option<XrayImage>, StoreError> {
        Ok(self.tables.read().await.images.get(&image_id).cloned())
    }

    async fn images_for_appointment(&self, appointment_id: Uuid) -> Result<Vec<XrayImage>, StoreError> {
        let tables = self.tables.read().await;
        let mut images: Vec<XrayImage> = tables
            .images
            .values()
            .filter(|image| image.appointment_id == appointment_id)
            .cloned()
            .collect();
        images.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(images)
    }

    async fn find_report(&self, report_id: Uuid) -> Result<Option<AiReport>, StoreError> {
        Ok(self.tables.read().await.reports.get(&report_id).cloned())
    }

    async fn reports_for_appointment(&self, appointment_id: Uuid) -> Result<Vec<AiReport>, StoreError> {
        Ok(self.tables.read().await.reports_for(appointment_id))
    }

    async fn all_reports(&self) -> Result<Vec<AiReport>, StoreError> {
        let tables = self.tables.read().await;
        let mut reports: Vec<AiReport> = tables.reports.values().cloned().collect();
        sort_reports(&mut reports);
        Ok(reports)
    }

    async fn mark_report_visible(&self, report_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let report = tables
            .reports
            .get_mut(&report_id)
            .ok_or_else(|| StoreError::not_found("AI report", report_id))?;

        let flipped = !report.is_visible;
        report.is_visible = true;
        Ok(flipped)
    }

    async fn find_diagnosis(&self, report_id: Uuid) -> Result<Option<DoctorDiagnosis>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .diagnoses
            .iter()
            .filter(|d| d.report_id == report_id)
            .max_by_key(|d| d.diagnosis_date)
            .cloned())
    }

    async fn upsert_diagnosis(&self, diagnosis: &DoctorDiagnosis) -> Result<DoctorDiagnosis, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.latest_diagnosis_mut(diagnosis.report_id) {
            existing.doctor_id = diagnosis.doctor_id;
            existing.diagnosis_result = diagnosis.diagnosis_result.clone();
            existing.comments = diagnosis.comments.clone();
            existing.diagnosis_date = diagnosis.diagnosis_date;
            return Ok(existing.clone());
        }

        tables.diagnoses.push(diagnosis.clone());
        Ok(diagnosis.clone())
    }

    async fn set_report_file_path(
        &self,
        report_id: Uuid,
        doctor_id: Uuid,
        path: Option<&str>,
    ) -> Result<DoctorDiagnosis, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.latest_diagnosis_mut(report_id) {
            existing.report_file_path = path.map(str::to_string);
            return Ok(existing.clone());
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
        tables.diagnoses.push(diagnosis.clone());
        Ok(diagnosis)
    }
}
