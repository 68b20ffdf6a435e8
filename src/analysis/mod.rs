// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection post-processing.
//!
//! Pure mapping from raw detections to the proctoring signals the API
//! promises. Label matching is exact and case-sensitive against the
//! model's vocabulary.

use serde::{Deserialize, Serialize};

use crate::detector::Detection;

/// Labels that count as a phone being present.
const PHONE_LABELS: [&str; 2] = ["remote", "cell phone"];

/// Label that counts as a face being present.
const PERSON_LABEL: &str = "person";

/// One detection as serialized in the response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionResult {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f32,
}

/// Response body for all analyze endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionSummary {
    pub phone_detected: bool,
    pub face_detected: bool,
    pub multiple_faces_detected: bool,
    /// Declared in the API contract but never computed; always false.
    pub looking_away: bool,
    pub results: Vec<DetectionResult>,
}

/// Derives the summary from a detection list. Deterministic; input order
/// never affects the boolean signals. An empty list yields all-false.
pub fn summarize(detections: &[Detection]) -> DetectionSummary {
    let phone_detected = detections
        .iter()
        .any(|d| PHONE_LABELS.contains(&d.label.as_str()));
    let face_count = detections.iter().filter(|d| d.label == PERSON_LABEL).count();

    let results = detections
        .iter()
        .map(|d| DetectionResult {
            label: d.label.clone(),
            confidence: d.confidence,
        })
        .collect();

    DetectionSummary {
        phone_detected,
        face_detected: face_count > 0,
        multiple_faces_detected: face_count > 1,
        looking_away: false,
        results,
    }
}
