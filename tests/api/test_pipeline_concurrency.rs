// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Concurrency behavior of the offloaded pipeline: the worker pool must
//! keep the runtime responsive and bound (not drop) excess requests.

use axum::http::StatusCode;
use proctor_vision_node::api::http_server::AppState;
use proctor_vision_node::api::http_server::router;
use proctor_vision_node::config::Settings;
use std::time::Duration;
use tower::ServiceExt;

use super::support::{get, multipart_upload, RecordingStore, ScriptedDetector};

#[tokio::test]
async fn test_liveness_probe_answers_while_detection_is_in_flight() {
    // Current-thread runtime on purpose: if the offloaded variant ever
    // ran its detect call inline, the probe below could not complete.
    let detector = ScriptedDetector::slow(Duration::from_millis(500));
    let app = router(AppState::new(
        detector,
        RecordingStore::new(),
        Settings::for_tests(),
    ));

    let slow_app = app.clone();
    let slow = tokio::spawn(async move {
        slow_app
            .oneshot(multipart_upload(
                "/analyze_image_efficicient",
                "webcam.png",
                "image/png",
                b"pixels",
            ))
            .await
            .unwrap()
    });

    // Give the slow request time to reach the worker pool.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let probe = tokio::time::timeout(Duration::from_millis(200), app.oneshot(get("/get")))
        .await
        .expect("liveness probe blocked behind an in-flight detection")
        .unwrap();
    assert_eq!(probe.status(), StatusCode::OK);

    let slow_response = slow.await.unwrap();
    assert_eq!(slow_response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_requests_beyond_pool_width_queue_and_complete() {
    let detector = ScriptedDetector::slow(Duration::from_millis(50));
    let mut settings = Settings::for_tests();
    settings.detect_workers = 2;
    let app = router(AppState::new(detector.clone(), RecordingStore::new(), settings));

    let requests = (0..6).map(|i| {
        let app = app.clone();
        let filename = format!("frame-{}.png", i);
        async move {
            app.oneshot(multipart_upload(
                "/analyze_image_efficicient",
                &filename,
                "image/png",
                b"pixels",
            ))
            .await
            .unwrap()
        }
    });

    let responses = futures::future::join_all(requests).await;

    // No silent drops: every request eventually completes.
    assert_eq!(responses.len(), 6);
    for response in responses {
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(detector.call_count(), 6);
}
