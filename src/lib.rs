// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analysis;
pub mod api;
pub mod config;
pub mod detector;
pub mod staging;
pub mod storage;
pub mod version;

// Re-export main types
pub use analysis::{summarize, DetectionResult, DetectionSummary};
pub use api::{ApiError, AppState, ErrorResponse};
pub use config::Settings;
pub use detector::{
    Detection, Detector, DetectorPool, ImageSource, InferenceError, CONFIDENCE_THRESHOLD,
};
pub use staging::{StagedFile, StagingError};
pub use storage::{ObjectStore, RemoteObjectRef, StorageError};
