// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint module
//!
//! Three pipeline variants over the same summary contract: remote-source
//! (object storage + URL), local-synchronous, and local-offloaded.

pub mod handler;

pub use handler::{
    analyze_handler, analyze_image_offloaded_handler, analyze_local_image_handler, hello_handler,
};
