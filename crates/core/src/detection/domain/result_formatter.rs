use crate::detection::domain::face::{DetectionResult, Face, FaceLandmark, LandmarkPosition};
use crate::detection::domain::landmark::LandmarkType;
use crate::detection::domain::native_detector::RawDetection;

/// Converts engine output into the wire result shape.
///
/// The rules are identical for single-shot and live-stream paths:
/// - bounding boxes are copied verbatim (source pixels, top-left origin);
/// - confidence is the first category's score clamped to [0, 1], or 0.0
///   when the engine reports no categories;
/// - landmarks map 1:1 from the keypoint list, `z` defaulting to 0.0;
///   the list is empty when landmarks are disabled or the engine has none.
///
/// Face order is whatever the engine emitted; zero detections produce an
/// empty `faces` list, never an error.
pub fn format_result(
    detections: &[RawDetection],
    enable_landmarks: bool,
    image_width: u32,
    image_height: u32,
    timestamp_ms: u64,
) -> DetectionResult {
    DetectionResult {
        faces: detections
            .iter()
            .map(|d| format_face(d, enable_landmarks))
            .collect(),
        image_width,
        image_height,
        timestamp: timestamp_ms,
    }
}

fn format_face(detection: &RawDetection, enable_landmarks: bool) -> Face {
    let confidence = detection
        .categories
        .first()
        .map_or(0.0, |c| c.score.clamp(0.0, 1.0));

    let landmarks = if enable_landmarks {
        detection
            .keypoints
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .map(|(index, kp)| FaceLandmark {
                landmark_type: LandmarkType::from_keypoint_index(index),
                position: LandmarkPosition {
                    x: kp.x,
                    y: kp.y,
                    z: kp.z.unwrap_or(0.0),
                },
            })
            .collect()
    } else {
        Vec::new()
    };

    Face {
        bounding_box: detection.bounding_box,
        confidence,
        landmarks,
    }
}
