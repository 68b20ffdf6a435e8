// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scoped temp staging for uploaded images.
//!
//! A [`StagedFile`] owns a uniquely named temp file whose suffix matches
//! the upload's extension (format-sniffing detectors inspect it). The
//! file is deleted when the value drops, which covers every exit path of
//! the enclosing request, including the client disconnecting mid-flight.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to stage upload: {0}")]
    Io(#[from] io::Error),
}

/// A staged upload on local disk. Must not outlive its request.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Writes `bytes` to a fresh temp file carrying the extension of
    /// `original_filename`.
    pub fn stage(bytes: &[u8], original_filename: &str) -> Result<Self, StagingError> {
        let suffix = Path::new(original_filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut tmp = tempfile::Builder::new()
            .prefix("proctor-upload-")
            .suffix(&suffix)
            .tempfile()?;
        tmp.write_all(bytes)?;
        tmp.flush()?;

        // Disarm tempfile's silent auto-delete; Drop below owns deletion
        // so failures get logged.
        let (_file, path) = tmp.keep().map_err(|e| StagingError::Io(e.error))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("temporary file {} deleted", self.path.display()),
            // Idempotent delete: missing is not an error.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "failed to delete temporary file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
