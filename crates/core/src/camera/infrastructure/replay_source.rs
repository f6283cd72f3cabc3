//! Camera stand-in that replays pre-decoded frames at a fixed rate.
//!
//! Behaves like a capture device that keeps producing the same pictures:
//! frames are pushed into the sink on a worker thread, stamped with the
//! wall clock at submission. Drives the live-demo CLI path and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::tick;

use crate::camera::domain::camera_source::{CameraSource, FrameSink};
use crate::shared::error::DetectorError;
use crate::shared::frame::{now_millis, Frame};

#[derive(Debug)]
pub struct ReplaySource {
    frames: Vec<Frame>,
    fps: u32,
    repeat: bool,
    preview_size: (u32, u32),
    stopped: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReplaySource {
    /// `frames` must be non-empty; the first frame's dimensions become the
    /// preview size. With `repeat` the list cycles until stopped,
    /// otherwise capture ends after one pass.
    pub fn new(frames: Vec<Frame>, fps: u32, repeat: bool) -> Result<Self, DetectorError> {
        if frames.is_empty() {
            return Err(DetectorError::CameraAccess(
                "replay source needs at least one frame".to_string(),
            ));
        }
        if fps == 0 {
            return Err(DetectorError::Camera(
                "replay rate must be at least 1 fps".to_string(),
            ));
        }
        let preview_size = (frames[0].width(), frames[0].height());
        Ok(Self {
            frames,
            fps,
            repeat,
            preview_size,
            stopped: Arc::new(AtomicBool::new(true)),
            worker: None,
        })
    }
}

impl CameraSource for ReplaySource {
    fn start(&mut self, sink: Box<dyn FrameSink>) -> Result<(), DetectorError> {
        if self.worker.is_some() {
            return Err(DetectorError::CameraBind(
                "replay source is already started".to_string(),
            ));
        }
        self.stopped.store(false, Ordering::Relaxed);

        let frames = self.frames.clone();
        let repeat = self.repeat;
        let stopped = self.stopped.clone();
        let ticker = tick(Duration::from_secs_f64(1.0 / f64::from(self.fps)));

        self.worker = Some(thread::spawn(move || {
            'replay: loop {
                for frame in &frames {
                    if ticker.recv().is_err() || stopped.load(Ordering::Relaxed) {
                        break 'replay;
                    }
                    sink.submit_frame(frame.clone().with_timestamp(now_millis()));
                }
                if !repeat {
                    break;
                }
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    fn preview_size(&self) -> (u32, u32) {
        self.preview_size
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CountingSink {
        timestamps: Arc<Mutex<Vec<u64>>>,
    }

    impl FrameSink for CountingSink {
        fn submit_frame(&self, frame: Frame) {
            self.timestamps.lock().unwrap().push(frame.timestamp_ms());
        }

        fn submit_error(&self, _error: DetectorError) {}
    }

    fn test_frame() -> Frame {
        Frame::new(vec![0u8; 4 * 3 * 3], 4, 3, 3, 0)
    }

    #[test]
    fn test_rejects_empty_frame_list() {
        let err = ReplaySource::new(vec![], 30, true).unwrap_err();
        assert!(matches!(err, DetectorError::CameraAccess(_)));
    }

    #[test]
    fn test_rejects_zero_fps() {
        let err = ReplaySource::new(vec![test_frame()], 0, true).unwrap_err();
        assert!(matches!(err, DetectorError::Camera(_)));
    }

    #[test]
    fn test_preview_size_comes_from_first_frame() {
        let source = ReplaySource::new(vec![test_frame()], 30, true).unwrap();
        assert_eq!(source.preview_size(), (4, 3));
    }

    #[test]
    fn test_streams_frames_until_stopped() {
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let mut source = ReplaySource::new(vec![test_frame()], 100, true).unwrap();
        source
            .start(Box::new(CountingSink {
                timestamps: timestamps.clone(),
            }))
            .unwrap();

        thread::sleep(Duration::from_millis(300));
        source.stop();
        let seen = timestamps.lock().unwrap().len();
        assert!(seen >= 2, "expected several frames, got {seen}");

        thread::sleep(Duration::from_millis(100));
        assert_eq!(timestamps.lock().unwrap().len(), seen, "frames after stop");
    }

    #[test]
    fn test_single_pass_without_repeat() {
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let frames = vec![test_frame(), test_frame(), test_frame()];
        let mut source = ReplaySource::new(frames, 200, false).unwrap();
        source
            .start(Box::new(CountingSink {
                timestamps: timestamps.clone(),
            }))
            .unwrap();

        thread::sleep(Duration::from_millis(300));
        source.stop();
        assert_eq!(timestamps.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_timestamps_are_non_decreasing() {
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let mut source = ReplaySource::new(vec![test_frame()], 100, true).unwrap();
        source
            .start(Box::new(CountingSink {
                timestamps: timestamps.clone(),
            }))
            .unwrap();
        thread::sleep(Duration::from_millis(200));
        source.stop();

        let stamps = timestamps.lock().unwrap();
        for pair in stamps.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_double_start_is_bind_error() {
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let mut source = ReplaySource::new(vec![test_frame()], 30, true).unwrap();
        source
            .start(Box::new(CountingSink {
                timestamps: timestamps.clone(),
            }))
            .unwrap();
        let err = source
            .start(Box::new(CountingSink { timestamps }))
            .unwrap_err();
        assert!(matches!(err, DetectorError::CameraBind(_)));
        source.stop();
    }

    #[test]
    fn test_start_again_after_stop() {
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let mut source = ReplaySource::new(vec![test_frame()], 100, true).unwrap();
        source
            .start(Box::new(CountingSink {
                timestamps: timestamps.clone(),
            }))
            .unwrap();
        thread::sleep(Duration::from_millis(100));
        source.stop();
        let after_first = timestamps.lock().unwrap().len();

        source
            .start(Box::new(CountingSink {
                timestamps: timestamps.clone(),
            }))
            .unwrap();
        thread::sleep(Duration::from_millis(150));
        source.stop();
        assert!(timestamps.lock().unwrap().len() > after_first);
    }
}
