pub mod face;
pub mod landmark;
pub mod native_detector;
pub mod result_formatter;
