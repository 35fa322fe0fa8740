use std::sync::Arc;

use crate::services::RecommendationEngine;

/// Shared application state
///
/// Requests never mutate it; each one runs its own pipeline through the engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
