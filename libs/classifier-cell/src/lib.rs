//! # Classifier Cell
//!
//! Client for the external pneumonia classification service and the
//! presentation rules applied to its output.
//!
//! - `services/client.rs`: multipart `POST {base_url}/predict` with finite
//!   connect and request timeouts, response validation and confidence
//!   normalization.
//! - `services/interpretation.rs`: percentage, confidence level and
//!   recommendation text derived from a stored score.
//!
//! Scores are normalized to `[0, 1]` once, at this boundary. Everything
//! downstream stores and compares normalized scores only.

pub mod models;
pub mod services;

pub use models::{Classification, ClassifierError, ConfidenceLevel, Interpretation};
pub use services::{interpret, Classifier, ClassifierClient};
