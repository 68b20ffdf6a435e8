// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server assembly: shared state, router, listener.

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::analyze::{
    analyze_handler, analyze_image_offloaded_handler, analyze_local_image_handler, hello_handler,
};
use super::middleware::access_log;
use crate::config::Settings;
use crate::detector::{Detector, DetectorPool};
use crate::storage::ObjectStore;

/// Maximum accepted upload size (10MB)
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Process-wide dependencies, injected into every handler.
///
/// The detector is loaded once at startup; the pool wraps that same
/// instance for the offloaded variants. Trait objects throughout so
/// tests substitute doubles without loading real weights.
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn Detector>,
    pub pool: Arc<DetectorPool>,
    pub store: Arc<dyn ObjectStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        detector: Arc<dyn Detector>,
        store: Arc<dyn ObjectStore>,
        settings: Settings,
    ) -> Self {
        let pool = Arc::new(DetectorPool::new(
            Arc::clone(&detector),
            settings.detect_workers,
        ));
        Self {
            detector,
            pool,
            store,
            settings: Arc::new(settings),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .settings
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Liveness probe
        .route("/get", get(hello_handler))
        // Remote-source variant: upload to object storage, detect by URL
        .route("/analyze", post(analyze_handler))
        // Local-synchronous variant
        .route("/analyze_local_image", post(analyze_local_image_handler))
        // Local-offloaded variant (path kept verbatim for deployed clients)
        .route(
            "/analyze_image_efficicient",
            post(analyze_image_offloaded_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.settings.listen_addr;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
