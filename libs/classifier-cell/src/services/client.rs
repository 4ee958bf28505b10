use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{Classification, ClassifierError};

/// Anything that can turn image bytes into a classification.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &[u8], file_name: &str) -> Result<Classification, ClassifierError>;
}

/// HTTP client for the pneumonia classification service.
#[derive(Debug)]
pub struct ClassifierClient {
    client: Client,
    base_url: String,
}

impl ClassifierClient {
    pub fn new(config: &AppConfig) -> Result<Self, ClassifierError> {
        if !config.is_classifier_configured() {
            return Err(ClassifierError::NotConfigured);
        }

        Self::with_timeouts(
            &config.classifier_base_url,
            config.classifier_connect_timeout(),
            config.classifier_request_timeout(),
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ClassifierError::NotConfigured);
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }
}

#[async_trait]
impl Classifier for ClassifierClient {
    async fn classify(&self, image: &[u8], file_name: &str) -> Result<Classification, ClassifierError> {
        let url = self.predict_url();
        info!("Sending {} bytes ({}) to classifier", image.len(), file_name);

        let part = multipart::Part::bytes(image.to_vec())
            .file_name(file_name.to_string())
            .mime_str("image/*")?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;

        debug!("Classifier response: {} - {}", status, body);

        if !status.is_success() {
            error!("Classifier request failed: {} - {}", status, body);
            return Err(ClassifierError::ServiceError {
                code: status.as_u16(),
                message: service_error_message(status.as_u16()),
            });
        }

        let classification = parse_response(&body)?;
        info!(
            "Classifier predicted {} (raw confidence {}, score {})",
            classification.prediction, classification.confidence_raw, classification.confidence_score
        );
        Ok(classification)
    }
}

fn service_error_message(code: u16) -> String {
    match code {
        503 => "AI service is temporarily unavailable. Please try again later.".to_string(),
        400 => "Invalid image file format. Please ensure the file is a valid X-ray image.".to_string(),
        500 => "AI service encountered an internal error. Please contact support.".to_string(),
        _ => format!("API request failed with status code: {}", code),
    }
}

/// Validates a `/predict` response body and normalizes its confidence.
pub fn parse_response(body: &str) -> Result<Classification, ClassifierError> {
    if body.trim().is_empty() {
        return Err(ClassifierError::EmptyResponse);
    }

    let json: Value = serde_json::from_str(body).map_err(|e| ClassifierError::MalformedResponse {
        message: format!("invalid JSON: {}", e),
        body: body.to_string(),
    })?;

    let Value::Object(fields) = json else {
        return Err(ClassifierError::MalformedResponse {
            message: "expected a JSON object".to_string(),
            body: body.to_string(),
        });
    };

    let schema_error = |fields: &Map<String, Value>| ClassifierError::SchemaError {
        present: fields.keys().cloned().collect(),
        body: body.to_string(),
    };

    let prediction = match fields.get("prediction").or_else(|| fields.get("diagnosis")) {
        Some(Value::String(label)) => label.clone(),
        _ => return Err(schema_error(&fields)),
    };

    let confidence_raw = match fields.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => return Err(schema_error(&fields)),
    }
    .ok_or_else(|| ClassifierError::MalformedResponse {
        message: "confidence is not numeric".to_string(),
        body: body.to_string(),
    })?;

    let confidence_score = normalize_confidence(confidence_raw).ok_or_else(|| {
        ClassifierError::MalformedResponse {
            message: format!("confidence {} is out of range", confidence_raw),
            body: body.to_string(),
        }
    })?;

    Ok(Classification {
        prediction,
        confidence_raw,
        confidence_score,
        raw_response: body.to_string(),
    })
}

/// Maps a raw confidence onto `[0, 1]`: values up to 1 are fractions, values
/// above 1 are percentages. `None` for negative, non-finite or >100 inputs.
pub fn normalize_confidence(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 || raw > 100.0 {
        return None;
    }
    Some(if raw <= 1.0 { raw } else { raw / 100.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_fraction_kept_as_is() {
        let c = parse_response(r#"{"prediction":"PNEUMONIA","confidence":0.93}"#).unwrap();
        assert_eq!(c.prediction, "PNEUMONIA");
        assert_eq!(c.confidence_raw, 0.93);
        assert_eq!(c.confidence_score, 0.93);
    }

    #[test]
    fn test_percentage_divided_once() {
        let c = parse_response(r#"{"diagnosis":"NORMAL","confidence":87.5}"#).unwrap();
        assert_eq!(c.prediction, "NORMAL");
        assert_eq!(c.confidence_score, 0.875);
    }

    #[test]
    fn test_numeric_string_confidence() {
        let c = parse_response(r#"{"prediction":"NORMAL","confidence":"0.61"}"#).unwrap();
        assert_eq!(c.confidence_score, 0.61);
    }

    #[test]
    fn test_exactly_one_is_fraction() {
        assert_eq!(normalize_confidence(1.0), Some(1.0));
        assert_eq!(normalize_confidence(100.0), Some(1.0));
    }

    #[test]
    fn test_out_of_range_confidence() {
        assert_matches!(
            parse_response(r#"{"prediction":"NORMAL","confidence":-0.2}"#),
            Err(ClassifierError::MalformedResponse { .. })
        );
        assert_matches!(
            parse_response(r#"{"prediction":"NORMAL","confidence":250}"#),
            Err(ClassifierError::MalformedResponse { .. })
        );
        assert_matches!(
            parse_response(r#"{"prediction":"NORMAL","confidence":"high"}"#),
            Err(ClassifierError::MalformedResponse { .. })
        );
    }

    #[test]
    fn test_body_shape_errors() {
        assert_matches!(parse_response("   "), Err(ClassifierError::EmptyResponse));
        assert_matches!(parse_response("<html>"), Err(ClassifierError::MalformedResponse { .. }));
        assert_matches!(parse_response("[1,2]"), Err(ClassifierError::MalformedResponse { .. }));
    }

    #[test]
    fn test_missing_fields_list_present_keys() {
        let err = parse_response(r#"{"label":"NORMAL","score":0.9}"#).unwrap_err();
        assert_matches!(err, ClassifierError::SchemaError { ref present, .. } if present == &vec!["label".to_string(), "score".to_string()]);

        assert_matches!(
            parse_response(r#"{"prediction":"NORMAL"}"#),
            Err(ClassifierError::SchemaError { .. })
        );
        assert_matches!(
            parse_response(r#"{"prediction":1,"confidence":0.5}"#),
            Err(ClassifierError::SchemaError { .. })
        );
    }

    #[test]
    fn test_empty_base_url_not_configured() {
        let result = ClassifierClient::with_timeouts("  ", Duration::from_secs(1), Duration::from_secs(1));
        assert_matches!(result, Err(ClassifierError::NotConfigured));
    }
}
