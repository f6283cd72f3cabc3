//! Continuous detection session for LIVE_STREAM mode.
//!
//! A live session owns a camera source, a keep-only-latest frame mailbox
//! and the analysis worker that owns the engine detector. Results and
//! failures are pushed over a channel; a detection failure never ends the
//! stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;

use crate::camera::domain::camera_source::{CameraSource, FrameSink};
use crate::detection::domain::face::DetectionResult;
use crate::detection::domain::native_detector::{DetectorBackend, NativeDetector};
use crate::detection::domain::result_formatter::format_result;
use crate::session::frame_mailbox::FrameMailbox;
use crate::shared::config::{DetectorConfig, DetectorOptions};
use crate::shared::error::{DetectorError, ErrorEvent};
use crate::shared::frame::{now_millis, Frame};

/// Push-mode output. Every processed frame emits at most one event.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum DetectionEvent {
    FaceDetected(DetectionResult),
    Error(ErrorEvent),
}

/// Bridges a camera source into the session mailbox. Intake is gated by
/// the session's enabled flag so a paused session discards frames at the
/// door instead of queueing them.
struct LiveFrameSink {
    mailbox: Arc<FrameMailbox>,
    enabled: Arc<AtomicBool>,
    events: Sender<DetectionEvent>,
}

impl FrameSink for LiveFrameSink {
    fn submit_frame(&self, frame: Frame) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }
        self.mailbox.put(frame);
    }

    fn submit_error(&self, error: DetectorError) {
        log::warn!("camera error: {error}");
        if self.enabled.load(Ordering::SeqCst) {
            let _ = self.events.send(DetectionEvent::Error(error.to_event()));
        }
    }
}

pub struct LiveSession {
    camera: Box<dyn CameraSource>,
    mailbox: Arc<FrameMailbox>,
    enabled: Arc<AtomicBool>,
    events: Sender<DetectionEvent>,
    worker: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Build the engine detector, bind the camera and spawn the analysis
    /// worker. Fails without side effects: on error the camera was either
    /// never started or already stopped by its own failure path.
    pub fn start(
        backend: Arc<dyn DetectorBackend>,
        config: DetectorConfig,
        mut camera: Box<dyn CameraSource>,
    ) -> Result<(Self, Receiver<DetectionEvent>), DetectorError> {
        let options = config.to_options()?;
        if options.running_mode.is_single_shot() {
            return Err(DetectorError::Camera(format!(
                "live streaming requires LIVE_STREAM mode, session is configured for {}",
                options.running_mode
            )));
        }

        let detector = backend.create(&options)?;
        let preview_size = camera.preview_size();
        let mailbox = Arc::new(FrameMailbox::new());
        let enabled = Arc::new(AtomicBool::new(true));
        let (events_tx, events_rx) = unbounded();

        camera.start(Box::new(LiveFrameSink {
            mailbox: mailbox.clone(),
            enabled: enabled.clone(),
            events: events_tx.clone(),
        }))?;
        log::info!(
            "live session started: backend={} preview={}x{}",
            backend.name(),
            preview_size.0,
            preview_size.1
        );

        let worker = {
            let mailbox = mailbox.clone();
            let enabled = enabled.clone();
            let events = events_tx.clone();
            thread::spawn(move || {
                run_analysis(detector, options, mailbox, enabled, events, preview_size);
            })
        };

        let session = Self {
            camera,
            mailbox,
            enabled,
            events: events_tx,
            worker: Some(worker),
        };
        Ok((session, events_rx))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Frames replaced in the mailbox before the worker could process them.
    pub fn dropped_frames(&self) -> u64 {
        self.mailbox.dropped()
    }

    pub fn preview_size(&self) -> (u32, u32) {
        self.camera.preview_size()
    }

    /// Push an externally captured frame through the same keep-only-latest
    /// intake the camera uses. Discarded while the session is disabled.
    pub fn submit_frame(&self, frame: Frame) {
        if self.enabled.load(Ordering::SeqCst) {
            self.mailbox.put(frame);
        }
    }

    /// Pause or resume the stream. Disabling stops the camera and discards
    /// newly submitted frames; one in-flight result may still arrive.
    /// Enabling restarts the camera into the existing mailbox and channel.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), DetectorError> {
        if self.enabled.load(Ordering::SeqCst) == enabled {
            return Ok(());
        }
        self.enabled.store(enabled, Ordering::SeqCst);
        if enabled {
            let sink = Box::new(LiveFrameSink {
                mailbox: self.mailbox.clone(),
                enabled: self.enabled.clone(),
                events: self.events.clone(),
            });
            if let Err(err) = self.camera.start(sink) {
                self.enabled.store(false, Ordering::SeqCst);
                return Err(err);
            }
            log::info!("live session resumed");
        } else {
            self.camera.stop();
            log::info!("live session paused");
        }
        Ok(())
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.camera.stop();
        self.mailbox.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Worker loop. Owns the engine detector for the lifetime of the stream;
/// ends when the mailbox closes or the event receiver goes away.
fn run_analysis(
    mut detector: Box<dyn NativeDetector>,
    options: DetectorOptions,
    mailbox: Arc<FrameMailbox>,
    enabled: Arc<AtomicBool>,
    events: Sender<DetectionEvent>,
    preview_size: (u32, u32),
) {
    let mut last_timestamp_ms: Option<u64> = None;
    while let Some(frame) = mailbox.take() {
        if !enabled.load(Ordering::SeqCst) {
            continue;
        }
        // The engine contract for streaming input: timestamps must be
        // strictly increasing, stale frames are dropped silently.
        if last_timestamp_ms.is_some_and(|last| frame.timestamp_ms() <= last) {
            log::debug!("skipping stale frame at {} ms", frame.timestamp_ms());
            continue;
        }
        match detector.detect(&frame) {
            Ok(raw) => {
                last_timestamp_ms = Some(frame.timestamp_ms());
                let result = format_result(
                    &raw,
                    options.enable_face_landmarks,
                    preview_size.0,
                    preview_size.1,
                    now_millis(),
                );
                if events.send(DetectionEvent::FaceDetected(result)).is_err() {
                    break;
                }
            }
            Err(err) => {
                log::warn!("live detection failed: {err}");
                if events.send(DetectionEvent::Error(err.to_event())).is_err() {
                    break;
                }
            }
        }
    }
    log::debug!("analysis worker exiting");
}
