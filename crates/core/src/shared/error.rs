use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error codes carried across the session boundary.
///
/// Codes are part of the wire contract: callers match on them, so the
/// strings never change even when messages do. Decode failures get their
/// own code so callers can tell bad input from a failing detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InitializationError,
    DecodeError,
    DetectionError,
    CameraError,
    CameraBindError,
    CameraAccessError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InitializationError => "INITIALIZATION_ERROR",
            ErrorCode::DecodeError => "DECODE_ERROR",
            ErrorCode::DetectionError => "DETECTION_ERROR",
            ErrorCode::CameraError => "CAMERA_ERROR",
            ErrorCode::CameraBindError => "CAMERA_BIND_ERROR",
            ErrorCode::CameraAccessError => "CAMERA_ACCESS_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error payload delivered on live-stream event channels.
///
/// Request/response operations return [`DetectorError`] directly; this is
/// the flattened form that crosses the event boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
    pub code: ErrorCode,
}

/// All failures the detection session protocol can surface.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The operation requires a successfully initialized session.
    #[error("face detector is not initialized")]
    NotInitialized,

    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),

    /// No detector backend registered under the requested name.
    #[error("detector backend '{0}' is not available")]
    BackendUnavailable(String),

    #[error("failed to initialize detector: {0}")]
    Initialization(String),

    #[error("failed to read image from {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch image from {url}: {source}")]
    ImageFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid base64 payload: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::error::ImageError),

    #[error("unsupported image source scheme in '{0}'")]
    UnsupportedScheme(String),

    #[error("face detection failed: {0}")]
    Detection(String),

    #[error("{operation} is not valid in {mode} mode")]
    ModeMismatch {
        operation: &'static str,
        mode: &'static str,
    },

    #[error("camera error: {0}")]
    Camera(String),

    #[error("failed to bind camera source: {0}")]
    CameraBind(String),

    #[error("camera access denied or unavailable: {0}")]
    CameraAccess(String),
}

impl DetectorError {
    /// The stable wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DetectorError::InvalidConfig(_)
            | DetectorError::BackendUnavailable(_)
            | DetectorError::Initialization(_) => ErrorCode::InitializationError,
            DetectorError::ImageRead { .. }
            | DetectorError::ImageFetch { .. }
            | DetectorError::Base64Decode(_)
            | DetectorError::ImageDecode(_)
            | DetectorError::UnsupportedScheme(_) => ErrorCode::DecodeError,
            DetectorError::NotInitialized
            | DetectorError::Detection(_)
            | DetectorError::ModeMismatch { .. } => ErrorCode::DetectionError,
            DetectorError::Camera(_) => ErrorCode::CameraError,
            DetectorError::CameraBind(_) => ErrorCode::CameraBindError,
            DetectorError::CameraAccess(_) => ErrorCode::CameraAccessError,
        }
    }

    /// Flatten into the event payload form.
    pub fn to_event(&self) -> ErrorEvent {
        ErrorEvent {
            message: self.to_string(),
            code: self.code(),
        }
    }
}
