// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use proctor_vision_node::{
    api::http_server::{start_server, AppState},
    config::Settings,
    detector::YoloDetector,
    storage::S3ObjectStore,
    version,
};
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("🚀 Starting Proctor Vision Node v{}", version::VERSION);

    let settings = Settings::from_env()?;

    // Load the detection model exactly once; every pipeline variant
    // shares this instance.
    let detector = YoloDetector::load(&settings.model_path, settings.annotated_dir.clone())?;
    info!("✅ Detection model ready ({})", settings.model_path.display());

    let store = S3ObjectStore::from_settings(&settings)?;
    info!("✅ Object store configured (bucket: {})", settings.s3_bucket);

    let state = AppState::new(Arc::new(detector), Arc::new(store), settings);

    start_server(state).await
}
