use std::path::PathBuf;
use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{RecordStore, StoreError, SupabaseClient, SupabaseRecordStore};
use shared_models::records::AppointmentStatus;

fn store_for(server: &MockServer) -> SupabaseRecordStore {
    let config = AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret".to_string(),
        classifier_base_url: "http://127.0.0.1:1".to_string(),
        classifier_connect_timeout_secs: 1,
        classifier_request_timeout_secs: 1,
        storage_root: PathBuf::from("./data"),
        api_port: 0,
    };
    SupabaseRecordStore::new(Arc::new(SupabaseClient::new(&config)))
}

fn appointment_row(id: Uuid, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "patient_id": Uuid::new_v4(),
        "appointment_date": "2025-04-02",
        "appointment_time": "10:30:00",
        "status": status,
        "is_seen": false,
        "created_at": "2025-04-01T08:00:00Z"
    })
}

#[tokio::test]
async fn test_compare_and_set_uses_filtered_patch() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.PENDING"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!({ "status": "APPROVED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(id, "APPROVED")])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let applied = store
        .compare_and_set_status(id, AppointmentStatus::Pending, AppointmentStatus::Approved)
        .await
        .unwrap();

    assert!(applied);
}

#[tokio::test]
async fn test_compare_and_set_reports_lost_race() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(id, "REJECTED")])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let applied = store
        .compare_and_set_status(id, AppointmentStatus::Pending, AppointmentStatus::Approved)
        .await
        .unwrap();

    assert!(!applied);
}

#[tokio::test]
async fn test_compare_and_set_missing_appointment() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let result = store
        .compare_and_set_status(id, AppointmentStatus::Pending, AppointmentStatus::Approved)
        .await;

    assert_matches!(result, Err(StoreError::NotFound { entity: "Appointment", .. }));
}

#[tokio::test]
async fn test_row_missing_is_seen_is_schema_error() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let mut row = appointment_row(id, "APPROVED");
    row.as_object_mut().unwrap().remove("is_seen");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert_matches!(store.find_appointment(id).await, Err(StoreError::Schema(_)));
}

#[tokio::test]
async fn test_mark_report_visible_already_visible() {
    let server = MockServer::start().await;
    let report_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/ai_reports"))
        .and(query_param("is_visible", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/ai_reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": report_id,
            "image_id": Uuid::new_v4(),
            "prediction": "PNEUMONIA",
            "confidence_score": 0.93,
            "generated_at": "2025-04-02T10:45:00Z",
            "is_visible": true
        }])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(!store.mark_report_visible(report_id).await.unwrap());
}

#[tokio::test]
async fn test_commit_ingestion_status_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_xray_ingestion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outcome": "status_conflict",
            "status": "PENDING"
        })))
        .mount(&server)
        .await;

    let appointment_id = Uuid::new_v4();
    let image = shared_models::records::XrayImage {
        id: Uuid::new_v4(),
        appointment_id,
        uploaded_by: Uuid::new_v4(),
        image_path: "uploads/scan.png".to_string(),
        upload_date: chrono::Utc::now(),
    };
    let report = shared_models::records::AiReport {
        id: Uuid::new_v4(),
        image_id: image.id,
        prediction: "NORMAL".to_string(),
        confidence_score: 0.7,
        generated_at: chrono::Utc::now(),
        is_visible: false,
    };

    let store = store_for(&server);
    let result = store.commit_ingestion(&image, &report).await;

    assert_matches!(
        result,
        Err(StoreError::StatusConflict { actual: AppointmentStatus::Pending, .. })
    );
}

#[tokio::test]
async fn test_commit_ingestion_sends_both_rows_with_service_key() {
    let server = MockServer::start().await;

    let appointment_id = Uuid::new_v4();
    let image = shared_models::records::XrayImage {
        id: Uuid::new_v4(),
        appointment_id,
        uploaded_by: Uuid::new_v4(),
        image_path: "uploads/scan.png".to_string(),
        upload_date: chrono::Utc::now(),
    };
    let report = shared_models::records::AiReport {
        id: Uuid::new_v4(),
        image_id: image.id,
        prediction: "PNEUMONIA".to_string(),
        confidence_score: 0.93,
        generated_at: chrono::Utc::now(),
        is_visible: false,
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_xray_ingestion"))
        .and(header("apikey", "test-anon-key"))
        .and(header("Authorization", "Bearer test-anon-key"))
        .and(body_json(json!({
            "p_image": serde_json::to_value(&image).unwrap(),
            "p_report": serde_json::to_value(&report).unwrap(),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "outcome": "committed" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.commit_ingestion(&image, &report).await.unwrap();
}

#[tokio::test]
async fn test_backend_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ai_reports"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert_matches!(store.all_reports().await, Err(StoreError::Backend(_)));
}
