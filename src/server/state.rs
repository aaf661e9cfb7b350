//! Application state management

use crate::inference::{Classifier, InferenceConfig, InferenceEngine};
use std::sync::Arc;

use super::ServerConfig;

/// Application state shared across handlers.
///
/// The classifier is loaded once at startup and never mutated.
pub struct AppState {
    pub config: ServerConfig,
    pub engine: InferenceEngine,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            config,
            engine: InferenceEngine::new(InferenceConfig::default(), classifier),
            started_at: chrono::Utc::now(),
        }
    }
}
