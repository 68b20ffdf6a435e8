// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 detector over ONNX Runtime.
//!
//! Wraps a single pre-loaded `ort` session. The session is created once at
//! startup (CUDA attempted, CPU fallback) and shared read-only behind an
//! `Arc<Mutex>`; `ort` requires exclusive access to run, so concurrent
//! invocations serialize on the lock.

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use super::{Detection, Detector, ImageSource, InferenceError};

/// YOLOv8 input resolution (square)
const INPUT_SIZE: usize = 640;

/// Cap on detections returned per image
const MAX_DETECTIONS: usize = 100;

/// COCO-80 class vocabulary, index-aligned with YOLOv8 output channels.
const COCO_LABELS: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Pre-loaded YOLOv8 model.
pub struct YoloDetector {
    session: Arc<Mutex<Session>>,
    /// When set, an annotated copy of every analyzed image is written here.
    /// Best-effort debug side channel; failures are logged, never returned.
    annotated_dir: Option<PathBuf>,
}

impl YoloDetector {
    /// Loads the ONNX weights from disk and builds the session.
    ///
    /// CUDA is optional: registered when available, otherwise we continue
    /// on CPU.
    pub fn load(model_path: &Path, annotated_dir: Option<PathBuf>) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }

        let mut builder = Session::builder()
            .context("Failed to create session builder")?
            .with_intra_threads(4)?;

        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let session = builder
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model {}", model_path.display()))?;

        info!("detection model loaded from {}", model_path.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            annotated_dir,
        })
    }

    fn read_source(&self, source: &ImageSource) -> Result<DynamicImage, InferenceError> {
        match source {
            ImageSource::Path(path) => image::open(path)
                .map_err(|e| InferenceError::Unreadable(format!("{}: {}", path.display(), e))),
            ImageSource::Bytes(bytes) => image::load_from_memory(bytes)
                .map_err(|e| InferenceError::Rejected(e.to_string())),
            ImageSource::Url(url) => {
                // Blocking fetch; only ever reached from inside the worker pool.
                let response = reqwest::blocking::get(url)
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| InferenceError::Unreadable(e.to_string()))?;
                let bytes = response
                    .bytes()
                    .map_err(|e| InferenceError::Unreadable(e.to_string()))?;
                image::load_from_memory(&bytes).map_err(|e| InferenceError::Rejected(e.to_string()))
            }
        }
    }

    fn infer(&self, rgb: &RgbImage, confidence_threshold: f32) -> Result<Vec<Detection>> {
        let imgsz = INPUT_SIZE;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Nearest);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("model session lock poisoned"))?;
        let outputs = session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.into_iter().map(|&x| x as usize).collect();
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0);

        let num_candidates = view.shape()[1];
        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;

        let mut detections = Vec::new();

        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let best = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let Some((class_id, &max_score)) = best else {
                continue;
            };

            if max_score > confidence_threshold {
                let cx = view[[0, i]];
                let cy = view[[1, i]];
                let w = view[[2, i]];
                let h = view[[3, i]];

                detections.push(Detection {
                    label: COCO_LABELS.get(class_id).copied().unwrap_or("object").to_string(),
                    confidence: max_score,
                    bounding_box: Some([
                        (cx - w / 2.0) * sx,
                        (cy - h / 2.0) * sy,
                        (cx + w / 2.0) * sx,
                        (cy + h / 2.0) * sy,
                    ]),
                });
            }
        }

        detections.sort_unstable_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        detections.truncate(MAX_DETECTIONS);
        Ok(detections)
    }

    fn persist_annotated(
        &self,
        dir: &Path,
        rgb: &RgbImage,
        detections: &[Detection],
        source: &ImageSource,
    ) -> Result<()> {
        fs::create_dir_all(dir)?;

        let mut canvas = rgb.clone();
        for detection in detections {
            let Some([x1, y1, x2, y2]) = detection.bounding_box else {
                continue;
            };
            let w = (x2 - x1).max(1.0) as u32;
            let h = (y2 - y1).max(1.0) as u32;
            let rect = Rect::at(x1 as i32, y1 as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, Rgb([255, 0, 0]));
        }

        let name = match source {
            ImageSource::Path(p) => {
                let stem = p
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".to_string());
                format!("{}-annotated.png", stem)
            }
            _ => {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or_default();
                format!("annotated-{}.png", millis)
            }
        };

        canvas.save(dir.join(name))?;
        Ok(())
    }
}

impl Detector for YoloDetector {
    fn detect(
        &self,
        source: ImageSource,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, InferenceError> {
        let img = self.read_source(&source)?;
        let rgb = img.to_rgb8();

        let detections = self
            .infer(&rgb, confidence_threshold)
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        if let Some(dir) = &self.annotated_dir {
            if let Err(e) = self.persist_annotated(dir, &rgb, &detections, &source) {
                warn!("failed to persist annotated copy: {}", e);
            }
        }

        Ok(detections)
    }
}
