// libs/appointment-cell/src/services/workflow.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::store::RecordStore;
use shared_models::records::{Appointment, AppointmentStatus, Patient, UserRole};

use crate::models::WorkflowError;
use crate::services::lifecycle::AppointmentLifecycleService;

const MAX_TRANSITION_ATTEMPTS: u32 = 3;

/// Booking, nurse review transitions and seen acknowledgment.
pub struct AppointmentWorkflowService {
    store: Arc<dyn RecordStore>,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentWorkflowService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    #[instrument(skip(self))]
    pub async fn book(
        &self,
        patient_id: Uuid,
        appointment_date: &str,
        appointment_time: &str,
    ) -> Result<Appointment, WorkflowError> {
        let date = parse_date(appointment_date)?;
        let time = parse_time(appointment_time)?;

        if self.store.find_patient(patient_id).await?.is_none() {
            return Err(WorkflowError::ValidationError(format!(
                "Patient {} does not exist",
                patient_id
            )));
        }

        let appointment = Appointment::new(patient_id, date, time);
        self.store.create_appointment(&appointment).await?;

        info!("Booked appointment {} for patient {} on {} {}", appointment.id, patient_id, date, time);
        Ok(appointment)
    }

    /// Moves an appointment along the nurse review edges.
    ///
    /// The write is conditional on the status read just before it. When
    /// another writer gets there first the fresh status is re-validated, so a
    /// stale request fails with `InvalidTransition` instead of overwriting.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
        actor_role: UserRole,
    ) -> Result<Appointment, WorkflowError> {
        self.lifecycle.validate_actor(actor_role)?;

        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let mut appointment = self.get(appointment_id).await?;
            let current = appointment.status;

            self.lifecycle.validate_status_transition(current, target)?;

            if self
                .store
                .compare_and_set_status(appointment_id, current, target)
                .await?
            {
                info!("Appointment {} moved {} -> {}", appointment_id, current, target);
                appointment.status = target;
                return Ok(appointment);
            }

            warn!(
                "Status of {} changed concurrently, retrying attempt {}/{}",
                appointment_id, attempt, MAX_TRANSITION_ATTEMPTS
            );
        }

        Err(WorkflowError::Contention(appointment_id))
    }

    /// Idempotent. Unknown ids are ignored and an empty list never reaches the store.
    pub async fn mark_seen(&self, appointment_ids: &[Uuid]) -> Result<usize, WorkflowError> {
        if appointment_ids.is_empty() {
            debug!("mark_seen called with no appointments");
            return Ok(0);
        }

        let updated = self.store.mark_appointments_seen(appointment_ids).await?;
        debug!("Marked {} of {} appointments as seen", updated, appointment_ids.len());
        Ok(updated)
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, WorkflowError> {
        self.store
            .find_appointment(appointment_id)
            .await?
            .ok_or(WorkflowError::NotFound(appointment_id))
    }

    pub async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, WorkflowError> {
        Ok(self.store.appointments_for_patient(patient_id).await?)
    }

    pub async fn appointments_with_status(
        &self,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, WorkflowError> {
        Ok(self.store.appointments_with_status(statuses).await?)
    }

    pub fn valid_transitions(&self, status: AppointmentStatus) -> &'static [AppointmentStatus] {
        self.lifecycle.get_valid_transitions(status)
    }

    /// Patient profile owned by a user account, if any.
    pub async fn patient_for_user(&self, user_id: Uuid) -> Result<Option<Patient>, WorkflowError> {
        Ok(self.store.find_patient_by_user(user_id).await?)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, WorkflowError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        WorkflowError::ValidationError(format!("Invalid appointment date '{}', expected YYYY-MM-DD", raw))
    })
}

fn parse_time(raw: &str) -> Result<NaiveTime, WorkflowError> {
    let raw_trimmed = raw.trim();
    NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M"))
        .map_err(|_| {
            WorkflowError::ValidationError(format!(
                "Invalid appointment time '{}', expected HH:MM or HH:MM:SS",
                raw
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parse_time("09:30:15").unwrap(), NaiveTime::from_hms_opt(9, 30, 15).unwrap());
        assert!(parse_time("9.30am").is_err());
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn test_parse_date_format() {
        assert!(parse_date("2025-04-02").is_ok());
        assert!(parse_date("02/04/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }
}
