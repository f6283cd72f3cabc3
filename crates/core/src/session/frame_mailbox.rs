use std::sync::{Condvar, Mutex};

use crate::shared::frame::Frame;

/// Keep-only-latest slot between a frame producer and the analysis worker.
///
/// `put` replaces any unprocessed frame, so a slow consumer always sees
/// the newest frame instead of a growing queue. `take` blocks until a
/// frame arrives or the mailbox closes; a frame already in the slot at
/// close time is still delivered.
pub struct FrameMailbox {
    slot: Mutex<Slot>,
    ready: Condvar,
}

struct Slot {
    frame: Option<Frame>,
    closed: bool,
    dropped: u64,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                frame: None,
                closed: false,
                dropped: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Deposit a frame, replacing any unprocessed one. Returns true when a
    /// stale frame was discarded. Frames offered after close are dropped.
    pub fn put(&self, frame: Frame) -> bool {
        let mut slot = self.slot.lock().unwrap();
        if slot.closed {
            return false;
        }
        let replaced = slot.frame.replace(frame).is_some();
        if replaced {
            slot.dropped += 1;
        }
        self.ready.notify_one();
        replaced
    }

    /// Block until a frame is available or the mailbox closes. `None`
    /// means closed and drained.
    pub fn take(&self) -> Option<Frame> {
        let mut slot = self.slot.lock().unwrap();
        loop {
            if let Some(frame) = slot.frame.take() {
                return Some(frame);
            }
            if slot.closed {
                return None;
            }
            slot = self.ready.wait(slot).unwrap();
        }
    }

    pub fn close(&self) {
        let mut slot = self.slot.lock().unwrap();
        slot.closed = true;
        self.ready.notify_all();
    }

    /// Frames discarded because a newer one replaced them.
    pub fn dropped(&self) -> u64 {
        self.slot.lock().unwrap().dropped
    }
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new()
    }
}
