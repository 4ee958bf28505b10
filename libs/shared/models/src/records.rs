use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// STORED ENUMS
// ==============================================================================

/// Raised when a stored or submitted category string matches no known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Patient,
    Nurse,
    Doctor,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Patient => write!(f, "PATIENT"),
            UserRole::Nurse => write!(f, "NURSE"),
            UserRole::Doctor => write!(f, "DOCTOR"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PATIENT" => Ok(UserRole::Patient),
            "NURSE" => Ok(UserRole::Nurse),
            "DOCTOR" => Ok(UserRole::Doctor),
            "ADMIN" => Ok(UserRole::Admin),
            _ => Err(UnknownVariant { kind: "role", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Uploaded,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Approved,
        AppointmentStatus::Rejected,
        AppointmentStatus::Completed,
        AppointmentStatus::Uploaded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Approved => "APPROVED",
            AppointmentStatus::Rejected => "REJECTED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Uploaded => "UPLOADED",
        }
    }

    /// Statuses from which an X-ray may be ingested (re-upload included).
    pub fn accepts_xray(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Uploaded)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant { kind: "appointment status", value: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

// ==============================================================================
// PROFILES
// ==============================================================================

/// Role profiles reference their owning user account by `user_id` only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub ic_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Nurse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub specialization: Option<String>,
}

// ==============================================================================
// WORKFLOW RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub is_seen: bool,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(patient_id: Uuid, appointment_date: NaiveDate, appointment_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            appointment_date,
            appointment_time,
            status: AppointmentStatus::Pending,
            is_seen: false,
            created_at: Utc::now(),
        }
    }

    /// Unseen approvals are the only appointment changes a patient is notified about.
    pub fn is_pending_notification(&self) -> bool {
        !self.is_seen && self.status == AppointmentStatus::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XrayImage {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub uploaded_by: Uuid,
    pub image_path: String,
    pub upload_date: DateTime<Utc>,
}

/// Classifier output as persisted. `confidence_score` is always within [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiReport {
    pub id: Uuid,
    pub image_id: Uuid,
    pub prediction: String,
    pub confidence_score: f64,
    pub generated_at: DateTime<Utc>,
    pub is_visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorDiagnosis {
    pub id: Uuid,
    pub report_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis_result: Option<String>,
    pub comments: Option<String>,
    pub diagnosis_date: DateTime<Utc>,
    pub report_file_path: Option<String>,
}
