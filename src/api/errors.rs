// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! API error taxonomy and its HTTP mapping.
//!
//! Inference failures deliberately carry no detail: internals are logged
//! at the pipeline boundary and the client sees a fixed generic message.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Client-caused: wrong content type, malformed or missing upload
    InvalidRequest(String),
    /// Remote upload failed; message carries a sanitized cause
    Storage(String),
    /// Model failed on the given source; detail stays server-side
    Inference,
    /// Anything else that should read as a generic server fault
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Inference | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone()),
            ApiError::Storage(msg) => ("storage_error", msg.clone()),
            ApiError::Inference => ("inference_error", "failed to analyze image".to_string()),
            ApiError::Internal(msg) => ("internal_error", msg.clone()),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ApiError::Inference => write!(f, "failed to analyze image"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidRequest(format!("malformed multipart upload: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
