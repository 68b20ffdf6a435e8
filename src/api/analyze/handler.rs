// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint handlers.
//!
//! Each handler walks the same pipeline: receive multipart upload →
//! make the image available (staged file or remote URL) → detect →
//! summarize → respond. Staged files are scope-owned, so cleanup runs on
//! every exit path, detector failures included.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::analysis::{summarize, DetectionSummary};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::detector::{ImageSource, CONFIDENCE_THRESHOLD};
use crate::staging::StagedFile;
use crate::storage;

struct UploadedImage {
    filename: String,
    bytes: Bytes,
}

/// Pulls the `file` field out of the multipart body and gates on an
/// `image/*` content type. The gate runs before anything is staged or
/// uploaded, for every variant.
async fn read_image_upload(multipart: &mut Multipart) -> Result<UploadedImage, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::InvalidRequest("upload is missing a filename".to_string()))?;

        let content_type = field.content_type().map(str::to_owned).unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(ApiError::InvalidRequest(
                "Invalid file type. Please upload an image.".to_string(),
            ));
        }

        let bytes = field.bytes().await?;
        return Ok(UploadedImage { filename, bytes });
    }

    Err(ApiError::InvalidRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

/// GET /get - liveness probe
pub async fn hello_handler() -> Json<Value> {
    Json(json!({"Hello": "World"}))
}

/// POST /analyze - remote-source variant
///
/// Uploads the image to object storage, derives its public URL, and
/// detects against that URL through the worker pool. No local staging,
/// so no cleanup step exists on this path.
pub async fn analyze_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectionSummary>, ApiError> {
    let upload = read_image_upload(&mut multipart).await?;

    let remote = storage::remote_ref(
        &state.settings.public_base_url,
        &state.settings.upload_key_prefix,
        &upload.filename,
    );
    info!(key = %remote.key, url = %remote.public_url, "uploading image for remote analysis");

    state.store.upload(&remote.key, &upload.bytes).await.map_err(|e| {
        error!("remote upload failed: {}", e);
        ApiError::from(e)
    })?;

    let detections = state
        .pool
        .detect(ImageSource::Url(remote.public_url), CONFIDENCE_THRESHOLD)
        .await
        .map_err(|e| {
            error!("error during prediction for {}: {}", remote.key, e);
            ApiError::Inference
        })?;

    Ok(Json(summarize(&detections)))
}

/// POST /analyze_local_image - local-synchronous variant
///
/// Stages the upload to a temp file and runs the detector inline on the
/// calling task. Blocking the runtime here is a deliberate, known
/// latency cost; the offloaded variant exists for traffic that cares.
pub async fn analyze_local_image_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectionSummary>, ApiError> {
    let upload = read_image_upload(&mut multipart).await?;

    let staged = StagedFile::stage(&upload.bytes, &upload.filename).map_err(|e| {
        error!("failed to save uploaded file: {}", e);
        ApiError::Internal("Failed to process the uploaded file.".to_string())
    })?;
    info!("temporary file saved at {}", staged.path().display());

    let detections = state
        .detector
        .detect(
            ImageSource::Path(staged.path().to_path_buf()),
            CONFIDENCE_THRESHOLD,
        )
        .map_err(|e| {
            error!("error during prediction: {}", e);
            ApiError::Inference
        })?;
    info!("prediction completed");

    Ok(Json(summarize(&detections)))
}

/// POST /analyze_image_efficicient - local-offloaded variant
///
/// Same staging as the synchronous variant, but the blocking detect call
/// is dispatched to the bounded worker pool so the runtime keeps serving
/// other requests while this one waits.
pub async fn analyze_image_offloaded_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectionSummary>, ApiError> {
    let upload = read_image_upload(&mut multipart).await?;

    let staged = StagedFile::stage(&upload.bytes, &upload.filename).map_err(|e| {
        error!("failed to save uploaded file: {}", e);
        ApiError::Internal("Failed to process the uploaded file.".to_string())
    })?;
    info!("temporary file saved at {}", staged.path().display());

    let detections = state
        .pool
        .detect(
            ImageSource::Path(staged.path().to_path_buf()),
            CONFIDENCE_THRESHOLD,
        )
        .await
        .map_err(|e| {
            error!("error during prediction: {}", e);
            ApiError::Inference
        })?;

    Ok(Json(summarize(&detections)))
}
