use serde::{Deserialize, Serialize};

use crate::detection::domain::landmark::LandmarkType;

/// Axis-aligned box in source-image pixels, origin at the top-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Landmark position in the backend's coordinate space. `z` is 0.0 for
/// backends that report no depth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmark {
    #[serde(rename = "type")]
    pub landmark_type: LandmarkType,
    pub position: LandmarkPosition,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    pub bounding_box: BoundingBox,
    /// Score of the detection's first category, 0.0 when the backend
    /// reports none. Always within [0, 1].
    pub confidence: f32,
    /// Empty when landmarks are disabled or the backend has none.
    pub landmarks: Vec<FaceLandmark>,
}

/// One completed detection pass.
///
/// For single-shot requests `image_width`/`image_height` are the decoded
/// source dimensions; for live streams they are the preview-surface
/// dimensions, which need not match the sensor resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub faces: Vec<Face>,
    pub image_width: u32,
    pub image_height: u32,
    /// Milliseconds since the Unix epoch at detection completion.
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_wire_format() {
        let result = DetectionResult {
            faces: vec![Face {
                bounding_box: BoundingBox {
                    x: 10.0,
                    y: 20.0,
                    width: 64.0,
                    height: 48.0,
                },
                confidence: 0.9,
                landmarks: vec![FaceLandmark {
                    landmark_type: LandmarkType::NoseTip,
                    position: LandmarkPosition {
                        x: 0.5,
                        y: 0.4,
                        z: 0.0,
                    },
                }],
            }],
            image_width: 640,
            image_height: 480,
            timestamp: 1_700_000_000_123,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"boundingBox\""));
        assert!(json.contains("\"imageWidth\":640"));
        assert!(json.contains("\"imageHeight\":480"));
        assert!(json.contains("\"timestamp\":1700000000123"));
        assert!(json.contains("\"type\":\"NOSE_TIP\""));
    }

    #[test]
    fn test_result_round_trips() {
        let result = DetectionResult {
            faces: vec![],
            image_width: 320,
            image_height: 240,
            timestamp: 7,
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: DetectionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
