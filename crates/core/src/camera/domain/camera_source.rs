use crate::shared::error::DetectorError;
use crate::shared::frame::Frame;

/// Receives frames and producer-side failures from a camera source.
///
/// Implemented by live sessions; sources push into it from whatever thread
/// they capture on.
pub trait FrameSink: Send {
    fn submit_frame(&self, frame: Frame);
    fn submit_error(&self, error: DetectorError);
}

/// A producer of camera frames.
///
/// Sources push frames into the sink as they arrive; pacing and
/// backpressure are the consumer's concern. `start` after `stop` begins a
/// fresh capture.
pub trait CameraSource: Send {
    fn start(&mut self, sink: Box<dyn FrameSink>) -> Result<(), DetectorError>;
    fn stop(&mut self);

    /// Preview-surface dimensions reported in live results. Callers must
    /// not assume these match the sensor resolution.
    fn preview_size(&self) -> (u32, u32);
}
