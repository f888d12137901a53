use quantumwaste::engine::config::SimulationConfig;
use quantumwaste::engine::predictor::DifficultyPredictor;
use std::sync::Arc;

/// Read-only state shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<DifficultyPredictor>,
    pub config: Arc<SimulationConfig>,
}

impl AppState {
    pub fn new(predictor: DifficultyPredictor, config: SimulationConfig) -> Self {
        Self {
            predictor: Arc::new(predictor),
            config: Arc::new(config),
        }
    }
}
