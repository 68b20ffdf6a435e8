// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote object storage seam.
//!
//! Uploads go to an S3-compatible store under a key derived from the
//! original filename. Key derivation applies no uniqueness salt, so
//! concurrent uploads of same-named files overwrite one another; that is
//! a documented limitation of the contract, kept deliberately.

pub mod s3;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;
use url::Url;

pub use s3::S3ObjectStore;

/// Percent-encode everything except unreserved characters and `/`,
/// matching how the public CDN expects keys in paths.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum StorageError {
    /// Parameter or validation problem (bad key, malformed credentials)
    #[error("invalid storage parameters: {0}")]
    InvalidParams(String),
    /// Transport, credential, or service failure
    #[error("object store request failed: {0}")]
    Transport(String),
}

/// Capability contract for the upload backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// A stored object: its key plus the derived public URL. No local
/// lifecycle; nothing deletes remote objects.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObjectRef {
    pub key: String,
    pub public_url: String,
}

/// Derives the storage key: `<prefix>/<original filename>`, verbatim.
pub fn object_key(prefix: &str, filename: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), filename)
}

/// Builds the public URL for a key. Pure string construction; performs
/// no network call and cannot fail.
pub fn build_public_url(base: &Url, key: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        utf8_percent_encode(key, KEY_ENCODE_SET)
    )
}

/// Key + public URL for one upload.
pub fn remote_ref(base: &Url, prefix: &str, filename: &str) -> RemoteObjectRef {
    let key = object_key(prefix, filename);
    let public_url = build_public_url(base, &key);
    RemoteObjectRef { key, public_url }
}
