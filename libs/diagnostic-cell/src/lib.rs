// libs/diagnostic-cell/src/lib.rs
//! # Diagnostic Cell
//!
//! X-ray ingestion and physician review.
//!
//! ## Ingestion
//! A nurse uploads an image for a COMPLETED (or already UPLOADED) appointment.
//! The bytes are stored, the classifier is called, and the image, its AI
//! report and the UPLOADED status are committed in one store call. Any
//! failure removes the stored bytes and leaves the appointment as it was.
//!
//! ## API Endpoints
//! - `POST /diagnostics/appointments/{id}/xray` - Upload and classify an X-ray
//! - `POST /diagnostics/appointments/{id}/diagnosis` - Doctor comments on the latest report
//! - `GET /diagnostics/reports` - All reports with image and diagnosis
//! - `POST /diagnostics/reports/{id}/file` - Attach or replace the e-report document
//! - `DELETE /diagnostics/reports/{id}/file` - Remove the e-report document
//! - `GET /diagnostics/reports/{id}/file` - Download the e-report document

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{PipelineError, FINAL_DIAGNOSIS};
pub use router::{diagnostic_routes, DiagnosticState};
pub use services::{DiagnosticPipeline, PhysicianReviewService};
