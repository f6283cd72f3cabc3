use std::collections::HashMap;
use std::sync::Arc;

use crate::detection::domain::native_detector::DetectorBackend;
use crate::shared::error::DetectorError;

/// Named detector backends, resolved once at startup.
///
/// Sessions look their backend up by name when they are built; a name that
/// was never registered fails right there with `BackendUnavailable`
/// instead of deferring the failure to the first detection call.
pub struct BackendRegistry {
    backends: HashMap<&'static str, Arc<dyn DetectorBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    pub fn register(&mut self, backend: Arc<dyn DetectorBackend>) {
        let name = backend.name();
        if self.backends.insert(name, backend).is_some() {
            log::warn!("detector backend '{name}' registered twice, keeping the newer one");
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn DetectorBackend>, DetectorError> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| DetectorError::BackendUnavailable(name.to_string()))
    }

    /// Registered backend names, sorted for stable diagnostics.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.backends.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
