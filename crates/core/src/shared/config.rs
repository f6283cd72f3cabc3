use serde::{Deserialize, Deserializer, Serialize};

use crate::shared::error::DetectorError;

/// How frames reach the detector.
///
/// IMAGE and VIDEO sessions answer single-shot requests; LIVE_STREAM
/// sessions push results over an event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunningMode {
    Image,
    Video,
    LiveStream,
}

impl RunningMode {
    pub const ALL: &[RunningMode] = &[
        RunningMode::Image,
        RunningMode::Video,
        RunningMode::LiveStream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunningMode::Image => "IMAGE",
            RunningMode::Video => "VIDEO",
            RunningMode::LiveStream => "LIVE_STREAM",
        }
    }

    /// Parse a wire-format mode string. Unrecognized values fall back to
    /// IMAGE with a warning, the same on every caller path.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "IMAGE" => RunningMode::Image,
            "VIDEO" => RunningMode::Video,
            "LIVE_STREAM" => RunningMode::LiveStream,
            other => {
                log::warn!("unrecognized running mode '{other}', falling back to IMAGE");
                RunningMode::Image
            }
        }
    }

    pub fn is_single_shot(&self) -> bool {
        matches!(self, RunningMode::Image | RunningMode::Video)
    }
}

impl Default for RunningMode {
    fn default() -> Self {
        RunningMode::Image
    }
}

impl std::fmt::Display for RunningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RunningMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(RunningMode::parse_lenient(&raw))
    }
}

/// Caller-facing detector configuration.
///
/// Every field is optional on the wire; omitted fields take the documented
/// defaults, so deserializing `{}` equals [`DetectorConfig::default`].
/// A config is immutable once a session is built from it; changing
/// anything means tearing the detector down and rebuilding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub max_num_faces: usize,
    pub enable_face_landmarks: bool,
    pub enable_face_classification: bool,
    pub running_mode: RunningMode,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            max_num_faces: 2,
            enable_face_landmarks: true,
            enable_face_classification: false,
            running_mode: RunningMode::Image,
        }
    }
}

impl DetectorConfig {
    /// Range-check caller input. Field names in messages match the wire
    /// format so callers see the name they actually wrote.
    pub fn validate(&self) -> Result<(), DetectorError> {
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(DetectorError::InvalidConfig(format!(
                "minDetectionConfidence must be within [0.0, 1.0], got {}",
                self.min_detection_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.min_tracking_confidence) {
            return Err(DetectorError::InvalidConfig(format!(
                "minTrackingConfidence must be within [0.0, 1.0], got {}",
                self.min_tracking_confidence
            )));
        }
        if self.max_num_faces == 0 {
            return Err(DetectorError::InvalidConfig(
                "maxNumFaces must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and produce the normalized options handed to backends.
    pub fn to_options(&self) -> Result<DetectorOptions, DetectorError> {
        self.validate()?;
        Ok(DetectorOptions {
            min_detection_confidence: self.min_detection_confidence,
            min_suppression_threshold: self.min_tracking_confidence,
            max_num_faces: self.max_num_faces,
            enable_face_landmarks: self.enable_face_landmarks,
            enable_face_classification: self.enable_face_classification,
            running_mode: self.running_mode,
        })
    }
}

/// Concrete, validated options a backend detector is constructed from.
///
/// The caller's `minTrackingConfidence` becomes the engine's suppression
/// threshold here; the caller-facing name stays stable while backends see
/// the knob under the name they implement.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOptions {
    pub min_detection_confidence: f32,
    pub min_suppression_threshold: f32,
    pub max_num_faces: usize,
    pub enable_face_landmarks: bool,
    pub enable_face_classification: bool,
    pub running_mode: RunningMode,
}
