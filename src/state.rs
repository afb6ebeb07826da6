use std::sync::Arc;

use crate::config::Settings;
use crate::model::ModelRuntime;
use crate::qa::QaStore;

/// Shared application state, loaded once at startup and passed into every
/// handler. `runtime` is either a fully loaded model or absent; there is no
/// in-between state a request can observe.
pub struct AppState {
    pub runtime: Option<Arc<ModelRuntime>>,
    pub qa: QaStore,
    pub settings: Settings,
}

impl AppState {
    pub fn new(runtime: Option<ModelRuntime>, qa: QaStore, settings: Settings) -> Self {
        Self {
            runtime: runtime.map(Arc::new),
            qa,
            settings,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.runtime.is_some()
    }
}
