use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

/// Validated classifier output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub prediction: String,
    /// Confidence exactly as the service reported it.
    pub confidence_raw: f64,
    /// Confidence normalized to `[0, 1]`.
    pub confidence_score: f64,
    pub raw_response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Moderate,
    Low,
}

impl ConfidenceLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            ConfidenceLevel::High
        } else if percentage >= 60.0 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Presentation derived from a stored report. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub prediction: String,
    pub confidence_score: f64,
    pub percentage: f64,
    pub level: ConfidenceLevel,
    pub recommendation: &'static str,
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier returned HTTP {code}: {message}")]
    ServiceError { code: u16, message: String },

    #[error("Classifier returned an empty response")]
    EmptyResponse,

    #[error("Classifier response is malformed: {message}")]
    MalformedResponse { message: String, body: String },

    #[error("Classifier response is missing expected fields; received fields: [{}]", .present.join(", "))]
    SchemaError { present: Vec<String>, body: String },

    #[error("Classifier request timed out")]
    Timeout,

    #[error("Classifier transport error: {message}")]
    Transport { message: String },

    #[error("Classifier not configured")]
    NotConfigured,
}

impl ClassifierError {
    /// The response body that caused the failure, when one was received.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            ClassifierError::MalformedResponse { body, .. } | ClassifierError::SchemaError { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClassifierError::Timeout
        } else {
            ClassifierError::Transport {
                message: err.to_string(),
            }
        }
    }
}

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        AppError::ClassificationUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(ConfidenceLevel::from_percentage(80.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_percentage(79.99), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_percentage(60.0), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_percentage(59.9), ConfidenceLevel::Low);
    }

    #[test]
    fn test_schema_error_lists_fields() {
        let err = ClassifierError::SchemaError {
            present: vec!["label".to_string(), "score".to_string()],
            body: "{}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Classifier response is missing expected fields; received fields: [label, score]"
        );
        assert_eq!(err.raw_payload(), Some("{}"));
    }
}
