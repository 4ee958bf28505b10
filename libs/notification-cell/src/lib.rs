// libs/notification-cell/src/lib.rs
//! # Notification Cell
//!
//! Report release and the patient notification badge.
//!
//! AI reports start hidden. Staff release them with `release`, after which
//! they appear in the patient's report views. The badge counts appointments
//! that are APPROVED and not yet seen; the notification center acknowledges
//! every shown id in one call.
//!
//! ## API Endpoints
//! - `POST /notifications/reports/{id}/release`
//! - `GET /notifications/appointments/{id}/reports`
//! - `GET /notifications/patients/{id}`
//! - `POST /notifications/acknowledge`

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{PatientReportView, VisibilityError};
pub use router::notification_routes;
pub use services::VisibilityNotifier;
