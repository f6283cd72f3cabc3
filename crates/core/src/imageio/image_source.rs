//! Inputs for single-shot detection and their decoding.
//!
//! All failure paths here are decode-class errors, kept distinct from
//! detection failures so callers can tell bad input from a broken engine.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::shared::error::DetectorError;
use crate::shared::frame::{now_millis, Frame};

/// Where a single-shot detection request gets its pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    /// `http(s)://` or `file://`.
    Uri(String),
    /// Base64-encoded image bytes; tolerates whitespace and an optional
    /// `data:` URL prefix.
    Base64(String),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Classify a caller-provided location string: `http(s)` and `file`
    /// URIs stay URIs, anything else is a filesystem path.
    pub fn from_location(raw: &str) -> ImageSource {
        if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with("file://")
        {
            ImageSource::Uri(raw.to_string())
        } else {
            ImageSource::Path(PathBuf::from(raw))
        }
    }

    /// Fetch and decode into an RGB frame stamped with the current time.
    pub fn decode(&self) -> Result<Frame, DetectorError> {
        let bytes = self.fetch_bytes()?;
        decode_bytes(&bytes)
    }

    fn fetch_bytes(&self) -> Result<Vec<u8>, DetectorError> {
        match self {
            ImageSource::Path(path) => read_file(path),
            ImageSource::Uri(uri) => fetch_uri(uri),
            ImageSource::Base64(payload) => decode_base64(payload),
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, DetectorError> {
    std::fs::read(path).map_err(|e| DetectorError::ImageRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn fetch_uri(uri: &str) -> Result<Vec<u8>, DetectorError> {
    if let Some(path) = uri.strip_prefix("file://") {
        return read_file(Path::new(path));
    }
    if uri.starts_with("http://") || uri.starts_with("https://") {
        let response = reqwest::blocking::get(uri)
            .and_then(|r| r.error_for_status())
            .map_err(|e| DetectorError::ImageFetch {
                url: uri.to_string(),
                source: e,
            })?;
        let bytes = response.bytes().map_err(|e| DetectorError::ImageFetch {
            url: uri.to_string(),
            source: e,
        })?;
        return Ok(bytes.to_vec());
    }
    Err(DetectorError::UnsupportedScheme(uri.to_string()))
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, DetectorError> {
    let body = if payload.starts_with("data:") {
        payload
            .split_once(',')
            .map(|(_, rest)| rest)
            .unwrap_or(payload)
    } else {
        payload
    };
    // Transports wrap payloads in newlines; the strict engine rejects
    // them, so strip whitespace first.
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(BASE64.decode(compact.as_bytes())?)
}

fn decode_bytes(bytes: &[u8]) -> Result<Frame, DetectorError> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = image.dimensions();
    Ok(Frame::new(image.into_raw(), width, height, 3, now_millis()))
}
