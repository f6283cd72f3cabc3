//! Landmark identifiers and the keypoint-index mapping.
//!
//! The short-range face model reports up to six keypoints in a fixed,
//! published order; indices beyond that table map to `Unknown`. Landmark
//! identifiers carry no geometric semantics here, they are names only.

use serde::{Deserialize, Serialize};

/// Named facial landmarks, in wire form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandmarkType {
    LeftEye,
    RightEye,
    NoseTip,
    MouthLeft,
    MouthRight,
    MouthCenter,
    LeftEar,
    RightEar,
    LeftCheek,
    RightCheek,
    ForeheadCenter,
    ChinGnathion,
    ChinLeftGonion,
    ChinRightGonion,
    Unknown,
}

/// Keypoint order of the short-range face model: right eye, left eye,
/// nose tip, mouth center, right ear tragion, left ear tragion.
const KEYPOINT_ORDER: [LandmarkType; 6] = [
    LandmarkType::RightEye,
    LandmarkType::LeftEye,
    LandmarkType::NoseTip,
    LandmarkType::MouthCenter,
    LandmarkType::RightEar,
    LandmarkType::LeftEar,
];

impl LandmarkType {
    /// Map a detector keypoint index to its landmark identifier.
    pub fn from_keypoint_index(index: usize) -> LandmarkType {
        KEYPOINT_ORDER
            .get(index)
            .copied()
            .unwrap_or(LandmarkType::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkType::LeftEye => "LEFT_EYE",
            LandmarkType::RightEye => "RIGHT_EYE",
            LandmarkType::NoseTip => "NOSE_TIP",
            LandmarkType::MouthLeft => "MOUTH_LEFT",
            LandmarkType::MouthRight => "MOUTH_RIGHT",
            LandmarkType::MouthCenter => "MOUTH_CENTER",
            LandmarkType::LeftEar => "LEFT_EAR",
            LandmarkType::RightEar => "RIGHT_EAR",
            LandmarkType::LeftCheek => "LEFT_CHEEK",
            LandmarkType::RightCheek => "RIGHT_CHEEK",
            LandmarkType::ForeheadCenter => "FOREHEAD_CENTER",
            LandmarkType::ChinGnathion => "CHIN_GNATHION",
            LandmarkType::ChinLeftGonion => "CHIN_LEFT_GONION",
            LandmarkType::ChinRightGonion => "CHIN_RIGHT_GONION",
            LandmarkType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for LandmarkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
