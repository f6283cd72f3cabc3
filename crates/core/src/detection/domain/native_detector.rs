use std::fmt;

use crate::detection::domain::face::BoundingBox;
use crate::shared::config::DetectorOptions;
use crate::shared::error::DetectorError;
use crate::shared::frame::Frame;

/// A keypoint as the underlying engine reports it. Coordinates are in the
/// engine's own space; `z` is present only for engines that report depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawKeypoint {
    pub x: f32,
    pub y: f32,
    pub z: Option<f32>,
}

/// A scored category attached to a detection.
#[derive(Clone, Debug, PartialEq)]
pub struct RawCategory {
    pub score: f32,
    pub label: Option<String>,
}

/// One detection exactly as the engine reported it, before protocol
/// normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub bounding_box: BoundingBox,
    pub categories: Vec<RawCategory>,
    /// `None` when the engine has no keypoint output at all.
    pub keypoints: Option<Vec<RawKeypoint>>,
}

impl RawDetection {
    pub fn boxes_only(bounding_box: BoundingBox, score: f32) -> Self {
        Self {
            bounding_box,
            categories: vec![RawCategory { score, label: None }],
            keypoints: None,
        }
    }
}

/// Capability interface for detection engines.
///
/// Implementations may be stateful, hence `&mut self`. Asynchronous
/// submission is a session concern: a live session runs its detector on a
/// dedicated worker thread, so engines stay synchronous.
pub trait NativeDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError>;
}

impl fmt::Debug for dyn NativeDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn NativeDetector")
    }
}

/// Builds detectors from validated options.
///
/// One backend is registered per engine at startup; every session
/// initialization creates a fresh detector, never shares one.
pub trait DetectorBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn create(&self, options: &DetectorOptions)
        -> Result<Box<dyn NativeDetector>, DetectorError>;
}
