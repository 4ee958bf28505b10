use std::path::PathBuf;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::records::UserRole;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub classifier_base_url: String,
    pub storage_root: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: String::new(),
            supabase_anon_key: "test-anon-key".to_string(),
            classifier_base_url: "http://127.0.0.1:8000".to_string(),
            storage_root: std::env::temp_dir().join("xray-clinic-test"),
        }
    }
}

impl TestConfig {
    pub fn with_classifier(mut self, base_url: impl Into<String>) -> Self {
        self.classifier_base_url = base_url.into();
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_supabase(mut self, url: impl Into<String>) -> Self {
        self.supabase_url = url.into();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            classifier_base_url: self.classifier_base_url.clone(),
            classifier_connect_timeout_secs: 2,
            classifier_request_timeout_secs: 5,
            storage_root: self.storage_root.clone(),
            api_port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl TestUser {
    pub fn new(email: &str, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, UserRole::Patient)
    }

    pub fn nurse(email: &str) -> Self {
        Self::new(email, UserRole::Nurse)
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, UserRole::Doctor)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, UserRole::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: Some(self.email.clone()),
            role: self.role,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        Self::sign_claims(
            json!({
                "sub": user.id,
                "email": user.email,
                "role": user.role,
            }),
            secret,
            exp_hours.unwrap_or(24),
        )
    }

    /// Token whose `role` claim is an arbitrary string.
    pub fn create_token_with_role(role: &str, secret: &str) -> String {
        Self::sign_claims(json!({ "sub": Uuid::new_v4(), "role": role }), secret, 1)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    fn sign_claims(mut claims: Value, secret: &str, exp_hours: i64) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours);
        claims["iat"] = json!(now.timestamp());
        claims["exp"] = json!(exp.timestamp());

        let header = json!({ "alg": "HS256", "typ": "JWT" });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature_encoded)
    }
}

/// Canned classifier payloads.
pub struct MockClassifierResponses;

impl MockClassifierResponses {
    pub fn prediction(label: &str, confidence: f64) -> Value {
        json!({ "prediction": label, "confidence": confidence })
    }

    pub fn legacy_diagnosis(label: &str, confidence: f64) -> Value {
        json!({ "diagnosis": label, "confidence": confidence })
    }
}

/// Canned PostgREST rows.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_row(patient_id: Uuid, user_id: Uuid) -> Value {
        json!({
            "id": patient_id,
            "user_id": user_id,
            "full_name": "Aisyah Rahman",
            "ic_number": "900101-14-5566",
            "date_of_birth": "1990-01-01",
            "gender": "FEMALE",
            "address": null
        })
    }

    pub fn appointment_row(appointment_id: Uuid, patient_id: Uuid, status: &str) -> Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "appointment_date": "2025-04-02",
            "appointment_time": "10:30:00",
            "status": status,
            "is_seen": false,
            "created_at": "2025-04-01T08:00:00Z"
        })
    }

    pub fn report_row(report_id: Uuid, image_id: Uuid, visible: bool) -> Value {
        json!({
            "id": report_id,
            "image_id": image_id,
            "prediction": "PNEUMONIA",
            "confidence_score": 0.93,
            "generated_at": "2025-04-02T10:45:00Z",
            "is_visible": visible
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({ "message": message, "code": code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let app_config = TestConfig::default()
            .with_classifier("http://classifier.test")
            .to_app_config();

        assert_eq!(app_config.classifier_base_url, "http://classifier.test");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
        assert!(!app_config.is_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        let user_model = user.to_user();

        assert_eq!(user_model.id, user.id);
        assert_eq!(user_model.role, UserRole::Doctor);
        assert_eq!(user_model.email.as_deref(), Some("doc@example.com"));
    }

    #[test]
    fn test_jwt_token_creation() {
        let token = JwtTestUtils::create_test_token(&TestUser::patient("p@example.com"), "secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }
}
