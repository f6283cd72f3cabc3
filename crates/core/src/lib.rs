//! Face detection sessions over pluggable engine backends.

pub mod camera;
pub mod detection;
pub mod imageio;
pub mod session;
pub mod shared;
