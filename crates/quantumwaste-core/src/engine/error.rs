use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::artifact::ArtifactError;
use crate::core::models::features::FeatureError;
use crate::core::models::polymer::PolymerError;
use crate::core::quantum::QuantumError;
use crate::core::regression::ModelError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Computation failed: {0}")]
    Computation(String),

    #[error("Quantum simulation failed: {source}")]
    Quantum {
        #[from]
        source: QuantumError,
    },

    #[error("Model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Artifact error: {source}")]
    Artifact {
        #[from]
        source: ArtifactError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

impl From<FeatureError> for EngineError {
    fn from(e: FeatureError) -> Self {
        EngineError::InvalidArgument(e.to_string())
    }
}

impl From<PolymerError> for EngineError {
    fn from(e: PolymerError) -> Self {
        EngineError::InvalidArgument(e.to_string())
    }
}
