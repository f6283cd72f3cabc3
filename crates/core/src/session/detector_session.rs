use std::sync::Arc;

use crate::detection::domain::face::DetectionResult;
use crate::detection::domain::native_detector::{DetectorBackend, NativeDetector};
use crate::detection::domain::result_formatter::format_result;
use crate::imageio::image_source::ImageSource;
use crate::shared::config::{DetectorConfig, DetectorOptions};
use crate::shared::constants::SUPPORTED_FEATURES;
use crate::shared::error::DetectorError;
use crate::shared::frame::{now_millis, Frame};

/// Request/response detection session for IMAGE and VIDEO modes.
///
/// A session is either fully initialized (engine detector and options set
/// together) or not initialized at all; a failed (re)initialization leaves
/// it uninitialized, never half-built. Configuration is immutable once
/// applied: changing it tears the engine detector down and builds a new
/// one from the next config snapshot.
pub struct DetectorSession {
    backend: Arc<dyn DetectorBackend>,
    detector: Option<Box<dyn NativeDetector>>,
    options: Option<DetectorOptions>,
}

impl DetectorSession {
    /// A new session starts uninitialized; every operation except the
    /// queries requires [`initialize`](Self::initialize) first.
    pub fn new(backend: Arc<dyn DetectorBackend>) -> Self {
        Self {
            backend,
            detector: None,
            options: None,
        }
    }

    /// Build the engine detector from `config`. Safe to call repeatedly;
    /// the previous detector is dropped before the new one is constructed,
    /// so one logical session never holds two engine detectors.
    pub fn initialize(&mut self, config: DetectorConfig) -> Result<(), DetectorError> {
        self.detector = None;
        self.options = None;

        let options = config.to_options()?;
        let detector = self.backend.create(&options)?;
        log::info!(
            "detector session initialized: backend={} mode={}",
            self.backend.name(),
            options.running_mode
        );
        self.detector = Some(detector);
        self.options = Some(options);
        Ok(())
    }

    /// Reconfiguration is re-initialization.
    pub fn update_config(&mut self, config: DetectorConfig) -> Result<(), DetectorError> {
        self.initialize(config)
    }

    pub fn is_initialized(&self) -> bool {
        self.detector.is_some()
    }

    /// The options the current detector was built from, if initialized.
    pub fn options(&self) -> Option<&DetectorOptions> {
        self.options.as_ref()
    }

    pub fn supported_features(&self) -> &'static [&'static str] {
        SUPPORTED_FEATURES
    }

    /// Decode `source` and run one detection pass. The initialization and
    /// mode preconditions are checked before any decode work happens.
    pub fn detect_image(&mut self, source: &ImageSource) -> Result<DetectionResult, DetectorError> {
        self.ensure_single_shot("detect_image")?;
        let frame = source.decode()?;
        self.run_detection(&frame)
    }

    /// Run one detection pass over an already-decoded frame.
    pub fn detect_frame(&mut self, frame: &Frame) -> Result<DetectionResult, DetectorError> {
        self.ensure_single_shot("detect_frame")?;
        self.run_detection(frame)
    }

    fn ensure_single_shot(&self, operation: &'static str) -> Result<(), DetectorError> {
        let options = self.options.as_ref().ok_or(DetectorError::NotInitialized)?;
        if !options.running_mode.is_single_shot() {
            return Err(DetectorError::ModeMismatch {
                operation,
                mode: options.running_mode.as_str(),
            });
        }
        Ok(())
    }

    fn run_detection(&mut self, frame: &Frame) -> Result<DetectionResult, DetectorError> {
        let (Some(detector), Some(options)) = (self.detector.as_mut(), self.options.as_ref())
        else {
            return Err(DetectorError::NotInitialized);
        };
        let raw = detector.detect(frame)?;
        Ok(format_result(
            &raw,
            options.enable_face_landmarks,
            frame.width(),
            frame.height(),
            now_millis(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face::BoundingBox;
    use crate::detection::domain::native_detector::{RawDetection, RawKeypoint};
    use crate::shared::config::RunningMode;
    use crate::shared::error::ErrorCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts engine handles and detect calls; optionally fails creation.
    struct StubBackend {
        fail_create: bool,
        live_detectors: Arc<AtomicUsize>,
        created: Arc<AtomicUsize>,
        detect_calls: Arc<AtomicUsize>,
        detections: Arc<Mutex<Vec<RawDetection>>>,
    }

    impl StubBackend {
        fn new() -> Self {
            Self {
                fail_create: false,
                live_detectors: Arc::new(AtomicUsize::new(0)),
                created: Arc::new(AtomicUsize::new(0)),
                detect_calls: Arc::new(AtomicUsize::new(0)),
                detections: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn with_detections(detections: Vec<RawDetection>) -> Self {
            let backend = Self::new();
            *backend.detections.lock().unwrap() = detections;
            backend
        }
    }

    impl DetectorBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn create(
            &self,
            _options: &DetectorOptions,
        ) -> Result<Box<dyn NativeDetector>, DetectorError> {
            if self.fail_create {
                return Err(DetectorError::Initialization("stub refused".to_string()));
            }
            if self.live_detectors.load(Ordering::SeqCst) != 0 {
                return Err(DetectorError::Initialization(
                    "previous detector still alive".to_string(),
                ));
            }
            self.live_detectors.fetch_add(1, Ordering::SeqCst);
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubDetector {
                live_detectors: self.live_detectors.clone(),
                detect_calls: self.detect_calls.clone(),
                detections: self.detections.clone(),
            }))
        }
    }

    struct StubDetector {
        live_detectors: Arc<AtomicUsize>,
        detect_calls: Arc<AtomicUsize>,
        detections: Arc<Mutex<Vec<RawDetection>>>,
    }

    impl Drop for StubDetector {
        fn drop(&mut self) {
            self.live_detectors.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl NativeDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
            self.detect_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detections.lock().unwrap().clone())
        }
    }

    fn face_at(x: f32, score: f32) -> RawDetection {
        RawDetection::boxes_only(
            BoundingBox {
                x,
                y: 10.0,
                width: 40.0,
                height: 40.0,
            },
            score,
        )
    }

    fn rgb_frame(width: u32, height: u32) -> Frame {
        Frame::new(
            vec![0u8; (width * height * 3) as usize],
            width,
            height,
            3,
            now_millis(),
        )
    }

    #[test]
    fn test_starts_uninitialized() {
        let session = DetectorSession::new(Arc::new(StubBackend::new()));
        assert!(!session.is_initialized());
        assert!(session.options().is_none());
    }

    #[test]
    fn test_initialize_sets_ready() {
        let mut session = DetectorSession::new(Arc::new(StubBackend::new()));
        session.initialize(DetectorConfig::default()).unwrap();
        assert!(session.is_initialized());
        assert_eq!(session.options().unwrap().max_num_faces, 2);
    }

    #[test]
    fn test_failed_initialize_leaves_uninitialized() {
        let backend = StubBackend {
            fail_create: true,
            ..StubBackend::new()
        };
        let mut session = DetectorSession::new(Arc::new(backend));
        let err = session.initialize(DetectorConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InitializationError);
        assert!(!session.is_initialized());
        assert!(session.options().is_none());
    }

    #[test]
    fn test_failed_reinitialize_tears_down_old_session() {
        let backend = StubBackend::new();
        let mut session = DetectorSession::new(Arc::new(backend));
        session.initialize(DetectorConfig::default()).unwrap();

        let bad_config = DetectorConfig {
            max_num_faces: 0,
            ..DetectorConfig::default()
        };
        assert!(session.initialize(bad_config).is_err());
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_reinitialize_drops_old_detector_before_building_new() {
        // The stub backend refuses to create while a previous detector is
        // still alive, so a second initialize passing proves teardown
        // happened first.
        let backend = StubBackend::new();
        let created = backend.created.clone();
        let mut session = DetectorSession::new(Arc::new(backend));
        session.initialize(DetectorConfig::default()).unwrap();
        session.initialize(DetectorConfig::default()).unwrap();
        assert!(session.is_initialized());
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_update_config_is_reinitialization() {
        let backend = StubBackend::new();
        let created = backend.created.clone();
        let mut session = DetectorSession::new(Arc::new(backend));
        session.initialize(DetectorConfig::default()).unwrap();
        session
            .update_config(DetectorConfig {
                max_num_faces: 4,
                ..DetectorConfig::default()
            })
            .unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(session.options().unwrap().max_num_faces, 4);
    }

    #[test]
    fn test_detect_before_initialize_rejects_without_engine_call() {
        let backend = StubBackend::new();
        let detect_calls = backend.detect_calls.clone();
        let created = backend.created.clone();
        let mut session = DetectorSession::new(Arc::new(backend));

        let err = session.detect_frame(&rgb_frame(8, 8)).unwrap_err();
        assert!(matches!(err, DetectorError::NotInitialized));
        assert_eq!(err.code(), ErrorCode::DetectionError);
        assert_eq!(created.load(Ordering::SeqCst), 0);
        assert_eq!(detect_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detect_image_checks_precondition_before_decoding() {
        let mut session = DetectorSession::new(Arc::new(StubBackend::new()));
        // Malformed payload, but the uninitialized check must win.
        let source = ImageSource::Base64("!!!".to_string());
        let err = session.detect_image(&source).unwrap_err();
        assert!(matches!(err, DetectorError::NotInitialized));
    }

    #[test]
    fn test_single_shot_operations_rejected_in_live_stream_mode() {
        let mut session = DetectorSession::new(Arc::new(StubBackend::new()));
        session
            .initialize(DetectorConfig {
                running_mode: RunningMode::LiveStream,
                ..DetectorConfig::default()
            })
            .unwrap();

        let err = session.detect_frame(&rgb_frame(8, 8)).unwrap_err();
        assert!(matches!(
            err,
            DetectorError::ModeMismatch {
                operation: "detect_frame",
                mode: "LIVE_STREAM",
            }
        ));

        // Mode is checked before any decode work, so a malformed source
        // still reports the mode error.
        let err = session
            .detect_image(&ImageSource::Base64("!!!".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            DetectorError::ModeMismatch {
                operation: "detect_image",
                ..
            }
        ));
    }

    #[test]
    fn test_detect_frame_returns_formatted_result() {
        let backend = StubBackend::with_detections(vec![face_at(5.0, 0.8), face_at(60.0, 0.7)]);
        let mut session = DetectorSession::new(Arc::new(backend));
        session
            .initialize(DetectorConfig {
                running_mode: RunningMode::Video,
                ..DetectorConfig::default()
            })
            .unwrap();

        let result = session.detect_frame(&rgb_frame(128, 96)).unwrap();
        assert_eq!(result.faces.len(), 2);
        assert_eq!(result.image_width, 128);
        assert_eq!(result.image_height, 96);
        assert!(result.timestamp > 0);
        assert_eq!(result.faces[0].confidence, 0.8);
        for face in &result.faces {
            let bb = &face.bounding_box;
            assert!(bb.x >= 0.0 && bb.x + bb.width <= 128.0);
            assert!(bb.y >= 0.0 && bb.y + bb.height <= 96.0);
        }
    }

    #[test]
    fn test_zero_detections_is_empty_faces() {
        let mut session = DetectorSession::new(Arc::new(StubBackend::new()));
        session.initialize(DetectorConfig::default()).unwrap();
        let result = session.detect_frame(&rgb_frame(8, 8)).unwrap();
        assert!(result.faces.is_empty());
    }

    #[test]
    fn test_landmarks_suppressed_when_disabled() {
        let mut detection = face_at(5.0, 0.9);
        detection.keypoints = Some(vec![RawKeypoint {
            x: 0.5,
            y: 0.5,
            z: None,
        }]);
        let backend = StubBackend::with_detections(vec![detection]);
        let mut session = DetectorSession::new(Arc::new(backend));
        session
            .initialize(DetectorConfig {
                enable_face_landmarks: false,
                ..DetectorConfig::default()
            })
            .unwrap();

        let result = session.detect_frame(&rgb_frame(8, 8)).unwrap();
        assert!(result.faces[0].landmarks.is_empty());
    }

    #[test]
    fn test_supported_features() {
        let session = DetectorSession::new(Arc::new(StubBackend::new()));
        assert_eq!(
            session.supported_features(),
            &["FACE_DETECTION", "FACE_LANDMARKS", "BOUNDING_BOX"]
        );
    }
}
