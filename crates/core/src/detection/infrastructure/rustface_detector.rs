//! Face detector backed by the `rustface` crate (SeetaFace engine).
//!
//! The engine works on grayscale pixels and reports unbounded cascade
//! scores, so this adapter converts frames to luma and squashes scores
//! into the protocol's [0, 1] confidence range. It reports no keypoints;
//! landmark lists stay legitimately empty on this backend.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::detection::domain::face::BoundingBox;
use crate::detection::domain::native_detector::{DetectorBackend, NativeDetector, RawDetection};
use crate::shared::config::DetectorOptions;
use crate::shared::error::DetectorError;
use crate::shared::frame::Frame;

/// Smallest face the engine will look for, in pixels. The engine rejects
/// values below 20.
const MIN_FACE_SIZE: u32 = 20;

/// Image pyramid scale between detection passes.
const PYRAMID_SCALE_FACTOR: f32 = 0.8;

/// Sliding window step in pixels, both axes.
const SLIDE_WINDOW_STEP: u32 = 4;

/// Decay constant of the score squash `1 - e^(-score / SCORE_DECAY)`.
/// Chosen so the engine's stock threshold of 2.0 maps to confidence 0.5,
/// making the default configuration behave like the unadapted engine.
const SCORE_DECAY: f64 = 2.0 / std::f64::consts::LN_2;

/// Floor for the engine score threshold, which must stay positive.
const MIN_SCORE_THRESH: f64 = 1e-3;

/// Squash an unbounded engine score into [0, 1]. Monotonic, so threshold
/// filtering and reported confidence always agree.
fn confidence_from_score(score: f64) -> f32 {
    (1.0 - (-score / SCORE_DECAY).exp()).clamp(0.0, 1.0) as f32
}

/// Inverse of [`confidence_from_score`]: the engine threshold at which
/// squashed scores reach `confidence`.
fn score_thresh_from_confidence(confidence: f32) -> f64 {
    let c = f64::from(confidence).clamp(0.0, 1.0 - 1e-6);
    (-SCORE_DECAY * (1.0 - c).ln()).max(MIN_SCORE_THRESH)
}

/// Interleaved frame bytes to 8-bit luma, BT.601 weights.
fn to_luma(frame: &Frame) -> Result<Vec<u8>, DetectorError> {
    let data = frame.data();
    match frame.channels() {
        1 => Ok(data.to_vec()),
        3 | 4 => {
            let step = frame.channels() as usize;
            Ok(data
                .chunks_exact(step)
                .map(|px| {
                    let r = u32::from(px[0]);
                    let g = u32::from(px[1]);
                    let b = u32::from(px[2]);
                    ((299 * r + 587 * g + 114 * b) / 1000) as u8
                })
                .collect())
        }
        other => Err(DetectorError::Detection(format!(
            "unsupported frame channel count {other}"
        ))),
    }
}

/// Detector over a parsed SeetaFace model.
///
/// The engine's detector type is not `Send`; the parsed model is, so a
/// fresh engine detector is built per call from a cloned model.
pub struct RustfaceDetector {
    model: rustface::Model,
    score_thresh: f64,
    max_num_faces: usize,
}

impl RustfaceDetector {
    pub fn from_model_path(
        model_path: &Path,
        options: &DetectorOptions,
    ) -> Result<Self, DetectorError> {
        let bytes = std::fs::read(model_path).map_err(|e| {
            DetectorError::Initialization(format!(
                "failed to read model {}: {e}",
                model_path.display()
            ))
        })?;
        let model = rustface::read_model(Cursor::new(bytes)).map_err(|e| {
            DetectorError::Initialization(format!(
                "failed to parse model {}: {e}",
                model_path.display()
            ))
        })?;
        Ok(Self {
            model,
            score_thresh: score_thresh_from_confidence(options.min_detection_confidence),
            max_num_faces: options.max_num_faces,
        })
    }
}

impl NativeDetector for RustfaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
        let gray = to_luma(frame)?;

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(self.score_thresh);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces =
            detector.detect(&rustface::ImageData::new(&gray, frame.width(), frame.height()));

        let mut detections: Vec<RawDetection> = faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                RawDetection::boxes_only(
                    BoundingBox {
                        x: bbox.x() as f32,
                        y: bbox.y() as f32,
                        width: bbox.width() as f32,
                        height: bbox.height() as f32,
                    },
                    confidence_from_score(face.score()),
                )
            })
            .collect();
        detections.truncate(self.max_num_faces);
        Ok(detections)
    }
}

/// Backend factory for [`RustfaceDetector`].
///
/// Holds only the model path; the model file is read and parsed on every
/// `create`, so a session re-initialization picks up a replaced file. The
/// suppression-threshold option has no engine knob here and is ignored.
pub struct RustfaceBackend {
    model_path: PathBuf,
}

impl RustfaceBackend {
    pub fn new(model_path: PathBuf) -> Self {
        Self { model_path }
    }
}

impl DetectorBackend for RustfaceBackend {
    fn name(&self) -> &'static str {
        "rustface"
    }

    fn create(
        &self,
        options: &DetectorOptions,
    ) -> Result<Box<dyn NativeDetector>, DetectorError> {
        Ok(Box::new(RustfaceDetector::from_model_path(
            &self.model_path,
            options,
        )?))
    }
}
