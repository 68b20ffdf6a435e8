// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection seam.
//!
//! The [`Detector`] trait hides the concrete model behind a synchronous
//! call contract: handlers either accept the blocking cost inline or go
//! through [`DetectorPool`] to keep the runtime responsive.

pub mod pool;
pub mod yolo;

use std::path::PathBuf;
use thiserror::Error;

pub use pool::DetectorPool;
pub use yolo::YoloDetector;

/// Minimum confidence below which the model discards candidate detections.
pub const CONFIDENCE_THRESHOLD: f32 = 0.3;

/// Where the detector reads the image from.
///
/// A request feeds the detector exactly one of these; the local-staging
/// variants use `Path`, the remote variant uses `Url`.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

/// One recognized object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class label from the model's vocabulary (e.g. "person", "cell phone")
    pub label: String,
    /// Confidence score in [0, 1]
    pub confidence: f32,
    /// Box corners as [x1, y1, x2, y2] in source-image pixels.
    /// Produced by the model but not surfaced in API responses.
    pub bounding_box: Option<[f32; 4]>,
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("image source unreadable: {0}")]
    Unreadable(String),
    #[error("model rejected input: {0}")]
    Rejected(String),
    #[error("inference backend error: {0}")]
    Backend(String),
    #[error("detection worker failed: {0}")]
    Worker(String),
}

/// Capability contract for a pre-loaded detection model.
///
/// `detect` is synchronous and may take hundreds of milliseconds to
/// seconds; never call it inline on the async runtime unless that cost
/// is deliberate. Implementations must be safe to share across threads.
pub trait Detector: Send + Sync {
    fn detect(
        &self,
        source: ImageSource,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, InferenceError>;
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            bounding_box: None,
        }
    }
}
