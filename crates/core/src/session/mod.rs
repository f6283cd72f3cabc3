pub mod detector_session;
pub mod frame_mailbox;
pub mod live_session;
