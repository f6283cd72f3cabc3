pub mod backend_registry;
pub mod model_resolver;
#[cfg(feature = "rustface")]
pub mod rustface_detector;
