// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! S3-compatible object store backend (Cloudflare R2 in production).

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::info;

use super::{ObjectStore, StorageError};
use crate::config::Settings;

pub struct S3ObjectStore {
    bucket: Box<Bucket>,
}

impl S3ObjectStore {
    pub fn from_settings(settings: &Settings) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: settings.s3_region.clone(),
            endpoint: settings.s3_endpoint.clone(),
        };

        let credentials = Credentials::new(
            Some(&settings.s3_access_key_id),
            Some(&settings.s3_secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::InvalidParams(e.to_string()))?;

        // Path-style addressing: R2 and most S3-compatible endpoints
        // expect the bucket in the path, not the host.
        let bucket = Bucket::new(&settings.s3_bucket, region, credentials)
            .map_err(|e| StorageError::InvalidParams(e.to_string()))?
            .with_path_style();

        Ok(Self { bucket })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object(key, bytes)
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Transport(format!(
                "object store returned status {} for key {}",
                status, key
            )));
        }

        info!("uploaded {} bytes to {}", bytes.len(), key);
        Ok(())
    }
}
