use std::{sync::Arc, time::Duration};

use podtrack_core::{
    remote::StatusUpdate, HttpAuthority, PodAuthority, PodError, TrackerBuilder, UploadFile,
};
use serde_json::json;
use wiremock::{
    matchers::{body_json, body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn authority(server: &MockServer) -> HttpAuthority {
    HttpAuthority::builder(server.uri())
        .with_timeout(Duration::from_secs(5))
        .with_token(Some("secret-token"))
        .build()
        .expect("Failed to build authority")
}

fn record_json(status: &str, version: u64) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "tripId": "T1",
            "clientId": "C1",
            "status": status,
            "version": version,
            "documents": [{
                "id": "d1",
                "stepKey": "complete",
                "url": "https://files.example.com/d1.pdf",
                "fileType": "pdf",
                "uploadedAt": "2024-03-01T10:00:00Z"
            }]
        }
    })
}

#[tokio::test]
async fn test_fetch_client_pod() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trips/T1/client/C1/pod"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json("complete", 4)))
        .expect(1)
        .mount(&server)
        .await;

    let record = authority(&server)
        .fetch_client_pod("T1", "C1")
        .await
        .expect("Failed to fetch");
    assert_eq!(record.status.as_deref(), Some("complete"));
    assert_eq!(record.version, 4);
    assert_eq!(record.documents.len(), 1);
}

#[tokio::test]
async fn test_fetch_missing_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = authority(&server)
        .fetch_client_pod("T1", "C1")
        .await
        .unwrap_err();
    assert!(matches!(err, PodError::ClientPodNotFound { .. }));
}

#[tokio::test]
async fn test_update_status_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/trips/client-pod-status/T1/C1"))
        .and(body_json(json!({"status": "pod_submitted", "version": 4})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "version": 5})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = authority(&server)
        .update_status(
            "T1",
            "C1",
            &StatusUpdate {
                status: "pod_submitted".to_string(),
                version: Some(4),
            },
        )
        .await
        .expect("Failed to update");
    assert!(response.success);
    assert_eq!(response.version, Some(5));
}

#[tokio::test]
async fn test_error_status_with_envelope_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"success": false, "message": "Version mismatch"})),
        )
        .mount(&server)
        .await;

    let response = authority(&server)
        .update_status(
            "T1",
            "C1",
            &StatusUpdate {
                status: "complete".to_string(),
                version: Some(1),
            },
        )
        .await
        .expect("Envelope should be returned");
    assert!(!response.success);
    assert_eq!(response.message.as_deref(), Some("Version mismatch"));
}

#[tokio::test]
async fn test_error_status_overrides_success_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"success": true, "version": 9})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let authority = authority(&server);
    let response = authority
        .update_status(
            "T1",
            "C1",
            &StatusUpdate {
                status: "complete".to_string(),
                version: Some(1),
            },
        )
        .await
        .expect("Envelope should be returned");
    assert!(!response.success);
    assert_eq!(response.version, None);
    assert_eq!(response.message.as_deref(), Some("HTTP 409"));
}

#[tokio::test]
async fn test_tracker_stays_put_on_error_status_claiming_success() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"success": true, "version": 2})),
        )
        .mount(&server)
        .await;

    let mut tracker = TrackerBuilder::new(Arc::new(authority(&server)))
        .attach("T1", "C1", Some("started"))
        .unwrap();
    let err = tracker.advance().await.unwrap_err();

    assert!(matches!(err, PodError::TransitionRejected { .. }));
    assert_eq!(tracker.current_index(), 0);
}

#[tokio::test]
async fn test_error_status_without_envelope_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = authority(&server)
        .update_status(
            "T1",
            "C1",
            &StatusUpdate {
                status: "complete".to_string(),
                version: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PodError::TransportFailure { ref message } if message.contains("502")));
}

#[tokio::test]
async fn test_tracker_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trips/T1/client/C1/pod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json("pod_received", 2)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/trips/client-pod-status/T1/C1"))
        .and(body_json(json!({"status": "pod_submitted", "version": 2})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "version": 3})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut tracker = TrackerBuilder::new(Arc::new(authority(&server)))
        .open("T1", "C1")
        .await
        .expect("Failed to open");
    assert_eq!(tracker.current_index(), 2);
    assert_eq!(tracker.documents()["complete"].len(), 1);

    tracker.advance().await.expect("Failed to advance");
    assert_eq!(tracker.current_index(), 3);
    assert_eq!(tracker.version(), Some(3));
}

#[tokio::test]
async fn test_tracker_rejected_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "Trip already settled"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut tracker = TrackerBuilder::new(Arc::new(authority(&server)))
        .attach("T1", "C1", Some("pod_submitted"))
        .unwrap();
    let err = tracker.advance().await.unwrap_err();

    assert!(matches!(err, PodError::TransitionRejected { .. }));
    assert_eq!(tracker.current_index(), 3);
}

#[tokio::test]
async fn test_upload_document_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trips/T1/client/podDocument"))
        .and(body_string_contains("name=\"stepKey\""))
        .and(body_string_contains("pod_received"))
        .and(body_string_contains("name=\"clientId\""))
        .and(body_string_contains("filename=\"pod.pdf\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "id": "d9",
                "stepKey": "pod_received",
                "url": "https://files.example.com/d9.pdf",
                "fileType": "pdf",
                "uploadedAt": "2024-03-02T08:30:00Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = TrackerBuilder::new(Arc::new(authority(&server)))
        .attach("T1", "C1", Some("pod_received"))
        .unwrap();
    let document = tracker
        .upload_evidence("pod_received", &UploadFile::new("pod.pdf", b"%PDF".to_vec()))
        .await
        .expect("Failed to upload");
    assert_eq!(document.id, "d9");
}

#[tokio::test]
async fn test_upload_server_error_is_upload_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tracker = TrackerBuilder::new(Arc::new(authority(&server)))
        .attach("T1", "C1", None)
        .unwrap();
    let err = tracker
        .upload_evidence("started", &UploadFile::new("pod.pdf", b"%PDF".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, PodError::UploadTransportFailure { .. }));
}

#[tokio::test]
async fn test_upload_single_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uploads"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": "https://files.example.com/u1.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tracker = TrackerBuilder::new(Arc::new(authority(&server)))
        .attach("T1", "C1", None)
        .unwrap();
    let url = tracker
        .upload_single(&UploadFile::new("signature.png", vec![0x89, 0x50]))
        .await
        .expect("Failed to upload");
    assert_eq!(url, "https://files.example.com/u1.png");
}

#[test]
fn test_empty_base_url_is_rejected() {
    let err = HttpAuthority::builder("/").build().unwrap_err();
    assert!(matches!(err, PodError::Configuration { .. }));
}
