use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use classifier_cell::{interpret, Classifier, ClassifierClient, ClassifierError, ConfidenceLevel};
use shared_utils::test_utils::{MockClassifierResponses, TestConfig};

fn client_for(server: &MockServer) -> ClassifierClient {
    ClassifierClient::with_timeouts(&server.uri(), Duration::from_secs(2), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_classify_posts_multipart_file() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockClassifierResponses::prediction("PNEUMONIA", 0.93)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let classification = client_for(&server).classify(b"fake-png", "chest.png").await.unwrap();

    assert_eq!(classification.prediction, "PNEUMONIA");
    assert_eq!(classification.confidence_score, 0.93);

    let view = interpret(&classification.prediction, classification.confidence_score);
    assert!((view.percentage - 93.0).abs() < 1e-9);
    assert_eq!(view.level, ConfidenceLevel::High);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"chest.png\""));
    assert!(body.contains("image/*"));
}

#[tokio::test]
async fn test_legacy_diagnosis_percentage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockClassifierResponses::legacy_diagnosis("NORMAL", 87.5)),
        )
        .mount(&server)
        .await;

    let classification = client_for(&server).classify(b"img", "scan.jpg").await.unwrap();

    assert_eq!(classification.prediction, "NORMAL");
    assert_eq!(classification.confidence_raw, 87.5);
    assert_eq!(classification.confidence_score, 0.875);
}

#[tokio::test]
async fn test_service_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server).classify(b"img", "scan.jpg").await;

    assert_matches!(result, Err(ClassifierError::ServiceError { code: 503, .. }));
}

#[tokio::test]
async fn test_empty_and_malformed_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_matches!(client.classify(b"img", "a.png").await, Err(ClassifierError::EmptyResponse));
    assert_matches!(
        client.classify(b"img", "a.png").await,
        Err(ClassifierError::MalformedResponse { .. })
    );
}

#[tokio::test]
async fn test_schema_error_reports_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "NORMAL" })))
        .mount(&server)
        .await;

    let err = client_for(&server).classify(b"img", "a.png").await.unwrap_err();

    assert_matches!(err, ClassifierError::SchemaError { ref present, .. } if present == &vec!["result".to_string()]);
    assert!(err.raw_payload().unwrap().contains("result"));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockClassifierResponses::prediction("NORMAL", 0.9))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client =
        ClassifierClient::with_timeouts(&server.uri(), Duration::from_secs(1), Duration::from_millis(300)).unwrap();

    assert_matches!(client.classify(b"img", "a.png").await, Err(ClassifierError::Timeout));
}

#[test]
fn test_client_from_config() {
    let config = TestConfig::default().with_classifier("http://classifier.local/").to_app_config();
    assert!(ClassifierClient::new(&config).is_ok());

    let unconfigured = TestConfig::default().with_classifier("").to_app_config();
    assert_matches!(ClassifierClient::new(&unconfigured), Err(ClassifierError::NotConfigured));
}
