// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded worker pool for blocking detector calls.
//!
//! Detection runs for hundreds of milliseconds to seconds; running it on
//! the runtime would stall every other in-flight request. The pool moves
//! each call onto `spawn_blocking` and bounds system-wide detection
//! concurrency with a semaphore. Waiters queue FIFO; none are dropped.

use std::sync::Arc;
use tokio::sync::Semaphore;

use super::{Detection, Detector, ImageSource, InferenceError};

pub struct DetectorPool {
    detector: Arc<dyn Detector>,
    permits: Arc<Semaphore>,
    width: usize,
}

impl DetectorPool {
    pub fn new(detector: Arc<dyn Detector>, width: usize) -> Self {
        let width = width.max(1);
        Self {
            detector,
            permits: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Runs a detector call off the runtime, suspending the caller until
    /// it completes. At most `width` calls execute at once.
    pub async fn detect(
        &self,
        source: ImageSource,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, InferenceError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| InferenceError::Worker(e.to_string()))?;

        let detector = Arc::clone(&self.detector);
        tokio::task::spawn_blocking(move || detector.detect(source, confidence_threshold))
            .await
            .map_err(|e| InferenceError::Worker(e.to_string()))?
    }
}
