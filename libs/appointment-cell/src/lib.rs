// libs/appointment-cell/src/lib.rs
//! # Appointment Cell
//!
//! Appointment booking and the nurse review state machine:
//!
//! ```text
//! PENDING -> APPROVED -> COMPLETED -> (UPLOADED, set by the diagnostic pipeline)
//!        \-> REJECTED
//! ```
//!
//! Status writes are compare-and-swap against the status the caller saw, so
//! two reviewers acting on the same appointment cannot both succeed.
//!
//! ## API Endpoints
//! - `POST /appointments` - Book an appointment
//! - `GET /appointments?status=PENDING,APPROVED` - Staff queue by status
//! - `GET /appointments/{id}` - Appointment with its valid next statuses
//! - `POST /appointments/{id}/transition` - Approve, reject or complete
//! - `GET /appointments/patients/{patient_id}` - A patient's appointments

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::WorkflowError;
pub use router::appointment_routes;
pub use services::{AppointmentLifecycleService, AppointmentWorkflowService};
