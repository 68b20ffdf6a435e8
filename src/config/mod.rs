// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process configuration, read from environment variables at startup.

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

/// Runtime settings for the node.
///
/// Everything has a development default so `cargo run` works out of the box;
/// production deployments override via environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the HTTP server binds to (`LISTEN_ADDR`)
    pub listen_addr: SocketAddr,
    /// Path to the YOLOv8 ONNX weights (`MODEL_PATH`)
    pub model_path: PathBuf,
    /// Width of the bounded detection worker pool (`DETECT_WORKERS`)
    pub detect_workers: usize,
    /// S3-compatible endpoint URL (`S3_ENDPOINT`)
    pub s3_endpoint: String,
    /// Bucket receiving remote uploads (`S3_BUCKET`)
    pub s3_bucket: String,
    /// Region label, "auto" for R2 (`S3_REGION`)
    pub s3_region: String,
    /// Access key id (`S3_ACCESS_KEY_ID`)
    pub s3_access_key_id: String,
    /// Secret access key (`S3_SECRET_ACCESS_KEY`)
    pub s3_secret_access_key: String,
    /// Public base URL the bucket is served from (`PUBLIC_BASE_URL`)
    pub public_base_url: Url,
    /// Fixed prefix prepended to derived storage keys (`UPLOAD_KEY_PREFIX`)
    pub upload_key_prefix: String,
    /// Directory for best-effort annotated debug copies (`ANNOTATED_DIR`);
    /// unset disables the side channel
    pub annotated_dir: Option<PathBuf>,
    /// Comma-separated CORS origin allow-list (`CORS_ORIGINS`)
    pub cors_origins: Vec<String>,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let listen_addr = env_or("LISTEN_ADDR", "0.0.0.0:8000")
            .parse::<SocketAddr>()
            .context("LISTEN_ADDR must be a socket address like 0.0.0.0:8000")?;

        let detect_workers = env::var("DETECT_WORKERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(4);

        let public_base_url = Url::parse(&env_or("PUBLIC_BASE_URL", "https://static.example.com"))
            .context("PUBLIC_BASE_URL must be a valid URL")?;

        Ok(Self {
            listen_addr,
            model_path: PathBuf::from(env_or("MODEL_PATH", "./models/yolov8n.onnx")),
            detect_workers,
            s3_endpoint: env_or("S3_ENDPOINT", "http://localhost:9000"),
            s3_bucket: env_or("S3_BUCKET", "uploads"),
            s3_region: env_or("S3_REGION", "auto"),
            s3_access_key_id: env_or("S3_ACCESS_KEY_ID", ""),
            s3_secret_access_key: env_or("S3_SECRET_ACCESS_KEY", ""),
            public_base_url,
            upload_key_prefix: env_or("UPLOAD_KEY_PREFIX", "uploads"),
            annotated_dir: env::var("ANNOTATED_DIR").ok().map(PathBuf::from),
            cors_origins: parse_origins(&env_or(
                "CORS_ORIGINS",
                "http://localhost:3000,http://localhost:3001",
            )),
        })
    }

    /// Settings for integration tests: loopback listener, no real model or
    /// bucket behind them (tests inject doubles for both).
    pub fn for_tests() -> Self {
        Self {
            listen_addr: "127.0.0.1:0".parse().expect("loopback address"),
            model_path: PathBuf::from("unused.onnx"),
            detect_workers: 4,
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_bucket: "test-bucket".to_string(),
            s3_region: "auto".to_string(),
            s3_access_key_id: String::new(),
            s3_secret_access_key: String::new(),
            public_base_url: Url::parse("https://static.example.com").expect("static base url"),
            upload_key_prefix: "uploads".to_string(),
            annotated_dir: None,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
