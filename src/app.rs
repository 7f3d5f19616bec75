use std::sync::Arc;

use crate::config::Config;
use crate::risk::RiskEngine;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: Arc<RiskEngine>,
}

impl AppState {
    /// Build the engine from configuration. Never fails: an unusable model
    /// artifact degrades to fallback scoring.
    pub fn new(cfg: Config) -> Self {
        let engine = RiskEngine::load(cfg.model.artifact_path.as_deref(), cfg.uncertainty);
        Self::with_engine(cfg, engine)
    }

    pub fn with_engine(cfg: Config, engine: RiskEngine) -> Self {
        Self {
            cfg: Arc::new(cfg),
            engine: Arc::new(engine),
        }
    }
}
