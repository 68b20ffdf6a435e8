// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Endpoint behavior tests for the three analyze variants and the
//! liveness probe, exercised through the full router with injected
//! detector and object-store doubles.

use axum::http::StatusCode;
use http_body_util::BodyExt;
use proctor_vision_node::api::http_server::router;
use proctor_vision_node::detector::{Detection, ImageSource};
use std::path::PathBuf;
use tower::ServiceExt;

use super::support::{get, multipart_upload, test_state, RecordingStore, ScriptedDetector};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = router(test_state(
        ScriptedDetector::returning(vec![]),
        RecordingStore::new(),
    ));

    let response = app.oneshot(get("/get")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"Hello": "World"}));
}

#[tokio::test]
async fn test_local_image_returns_summary() {
    let detector = ScriptedDetector::returning(vec![
        Detection::new("person", 0.92),
        Detection::new("cell phone", 0.41),
    ]);
    let app = router(test_state(detector.clone(), RecordingStore::new()));

    let response = app
        .oneshot(multipart_upload(
            "/analyze_local_image",
            "webcam.jpg",
            "image/jpeg",
            b"not really a jpeg, the double does not care",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["phone_detected"], true);
    assert_eq!(json["face_detected"], true);
    assert_eq!(json["multiple_faces_detected"], false);
    assert_eq!(json["looking_away"], false);
    assert_eq!(json["results"][0]["class"], "person");
    assert_eq!(json["results"][1]["class"], "cell phone");
    assert_eq!(detector.call_count(), 1);
}

#[tokio::test]
async fn test_local_image_rejects_non_image_without_invoking_detector() {
    let detector = ScriptedDetector::returning(vec![Detection::new("person", 0.9)]);
    let app = router(test_state(detector.clone(), RecordingStore::new()));

    let response = app
        .oneshot(multipart_upload(
            "/analyze_local_image",
            "notes.txt",
            "text/plain",
            b"just some text",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error_type"], "invalid_request");
    assert_eq!(detector.call_count(), 0);
}

#[tokio::test]
async fn test_local_image_missing_file_field_is_client_error() {
    let detector = ScriptedDetector::returning(vec![]);
    let app = router(test_state(detector.clone(), RecordingStore::new()));

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/analyze_local_image")
        .header(
            axum::http::header::CONTENT_TYPE,
            "multipart/form-data; boundary=empty",
        )
        .body(axum::body::Body::from("--empty--\r\n"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detector.call_count(), 0);
}

#[tokio::test]
async fn test_staged_file_is_deleted_after_detector_failure() {
    let detector = ScriptedDetector::failing();
    let app = router(test_state(detector.clone(), RecordingStore::new()));

    let response = app
        .oneshot(multipart_upload(
            "/analyze_local_image",
            "webcam.png",
            "image/png",
            b"pixels",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["message"], "failed to analyze image");

    // The detector saw a staged path; it must be gone now.
    let staged = staged_path(&detector);
    assert!(!staged.exists(), "staged temp file leaked: {:?}", staged);
}

#[tokio::test]
async fn test_staged_file_is_deleted_after_success() {
    let detector = ScriptedDetector::returning(vec![Detection::new("person", 0.9)]);
    let app = router(test_state(detector.clone(), RecordingStore::new()));

    let response = app
        .oneshot(multipart_upload(
            "/analyze_local_image",
            "webcam.png",
            "image/png",
            b"pixels",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let staged = staged_path(&detector);
    assert!(!staged.exists(), "staged temp file leaked: {:?}", staged);
}

#[tokio::test]
async fn test_staged_file_suffix_matches_upload_extension() {
    let detector = ScriptedDetector::returning(vec![]);
    let app = router(test_state(detector.clone(), RecordingStore::new()));

    app.oneshot(multipart_upload(
        "/analyze_image_efficicient",
        "frame.jpeg",
        "image/jpeg",
        b"pixels",
    ))
    .await
    .unwrap();

    let staged = staged_path(&detector);
    assert_eq!(staged.extension().and_then(|e| e.to_str()), Some("jpeg"));
}

#[tokio::test]
async fn test_offloaded_variant_applies_content_type_gate() {
    let detector = ScriptedDetector::returning(vec![]);
    let app = router(test_state(detector.clone(), RecordingStore::new()));

    let response = app
        .oneshot(multipart_upload(
            "/analyze_image_efficicient",
            "notes.txt",
            "text/plain",
            b"text",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detector.call_count(), 0);
}

#[tokio::test]
async fn test_remote_variant_uploads_then_detects_by_public_url() {
    let detector = ScriptedDetector::returning(vec![Detection::new("person", 0.9)]);
    let store = RecordingStore::new();
    let app = router(test_state(detector.clone(), store.clone()));

    let response = app
        .oneshot(multipart_upload(
            "/analyze",
            "my exam photo.jpg",
            "image/jpeg",
            b"pixels",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.uploaded_keys(), vec!["uploads/my exam photo.jpg"]);

    // The detector's input source must be the percent-encoded public URL,
    // never a local path.
    match detector.last_source() {
        Some(ImageSource::Url(url)) => {
            assert_eq!(
                url,
                "https://static.example.com/uploads/my%20exam%20photo.jpg"
            );
        }
        other => panic!("expected URL source, got {:?}", other),
    }
}

#[tokio::test]
async fn test_remote_variant_rejects_non_image_before_upload() {
    let detector = ScriptedDetector::returning(vec![]);
    let store = RecordingStore::new();
    let app = router(test_state(detector.clone(), store.clone()));

    let response = app
        .oneshot(multipart_upload("/analyze", "notes.txt", "text/plain", b"x"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.uploaded_keys().is_empty());
    assert_eq!(detector.call_count(), 0);
}

fn staged_path(detector: &ScriptedDetector) -> PathBuf {
    match detector.last_source() {
        Some(ImageSource::Path(path)) => path,
        other => panic!("expected path source, got {:?}", other),
    }
}
