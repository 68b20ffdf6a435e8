// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analyze;
pub mod errors;
pub mod http_server;
pub mod middleware;

pub use analyze::{
    analyze_handler, analyze_image_offloaded_handler, analyze_local_image_handler, hello_handler,
};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{router, start_server, AppState};
