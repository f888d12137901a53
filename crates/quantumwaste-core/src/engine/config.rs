use crate::core::models::features::{DEFAULT_PRESSURE, DEFAULT_TEMPERATURE};
use crate::core::models::polymer::CompositionMode;
use crate::core::regression::forest::ForestParams;
use crate::core::regression::tree::TreeParams;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const MODEL_FILE_NAME: &str = "recycling_model.bin";
pub const SCALER_FILE_NAME: &str = "scaler.bin";
pub const LOCK_FILE_NAME: &str = ".bootstrap.lock";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        parameter,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub iterations: usize,
    pub step_size: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            step_size: 0.4,
        }
    }
}

/// Settings for bootstrapping the difficulty predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub artifacts_dir: PathBuf,
    /// Rows in the synthetic training set.
    pub samples: usize,
    pub trees: usize,
    pub max_depth: usize,
    /// Share of the synthetic set held out for scoring.
    pub test_fraction: f64,
    pub seed: u64,
    /// Standard deviation of the Gaussian noise added to synthetic targets.
    pub noise_std: f64,
    /// How long a process waits for another process's bootstrap before giving up.
    pub lock_timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("models"),
            samples: 10_000,
            trees: 200,
            max_depth: 10,
            test_fraction: 0.2,
            seed: 42,
            noise_std: 0.1,
            lock_timeout: Duration::from_secs(600),
        }
    }
}

impl ModelConfig {
    pub fn lock_path(&self) -> PathBuf {
        self.artifacts_dir.join(LOCK_FILE_NAME)
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.trees,
            tree: TreeParams {
                max_depth: self.max_depth,
                ..TreeParams::default()
            },
            bootstrap: true,
            seed: self.seed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples < 10 {
            return Err(invalid("samples", "at least 10 synthetic samples are required"));
        }
        if self.trees == 0 {
            return Err(invalid("trees", "must be at least 1"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(invalid("test_fraction", "must lie strictly between 0 and 1"));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(invalid("noise_std", "must be a non-negative finite number"));
        }
        Ok(())
    }
}

/// Values used for fields a simulation request leaves out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestDefaults {
    pub length: usize,
    pub composition: CompositionMode,
    pub temperature: f64,
    pub pressure: f64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            length: 10,
            composition: CompositionMode::Random,
            temperature: DEFAULT_TEMPERATURE,
            pressure: DEFAULT_PRESSURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub optimizer: OptimizerConfig,
    pub model: ModelConfig,
    /// Largest polymer length a request may ask for.
    pub max_length: usize,
    pub defaults: RequestDefaults,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            model: ModelConfig::default(),
            max_length: 10_000,
            defaults: RequestDefaults::default(),
        }
    }
}

impl SimulationConfig {
    pub fn model_dir(&self) -> &Path {
        &self.model.artifacts_dir
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    artifacts_dir: Option<PathBuf>,
    iterations: Option<usize>,
    step_size: Option<f64>,
    samples: Option<usize>,
    trees: Option<usize>,
    max_depth: Option<usize>,
    test_fraction: Option<f64>,
    seed: Option<u64>,
    noise_std: Option<f64>,
    lock_timeout: Option<Duration>,
    max_length: Option<usize>,
    defaults: Option<RequestDefaults>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts_dir(mut self, dir: PathBuf) -> Self {
        self.artifacts_dir = Some(dir);
        self
    }
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }
    pub fn step_size(mut self, step_size: f64) -> Self {
        self.step_size = Some(step_size);
        self
    }
    pub fn samples(mut self, samples: usize) -> Self {
        self.samples = Some(samples);
        self
    }
    pub fn trees(mut self, trees: usize) -> Self {
        self.trees = Some(trees);
        self
    }
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = Some(fraction);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn noise_std(mut self, std: f64) -> Self {
        self.noise_std = Some(std);
        self
    }
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }
    pub fn defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Assembles the configuration. The artifact directory is required; every other setting
    /// falls back to its default.
    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let model_defaults = ModelConfig::default();
        let optimizer_defaults = OptimizerConfig::default();

        let optimizer = OptimizerConfig {
            iterations: self.iterations.unwrap_or(optimizer_defaults.iterations),
            step_size: self.step_size.unwrap_or(optimizer_defaults.step_size),
        };
        if !optimizer.step_size.is_finite() {
            return Err(invalid("step_size", "must be a finite number"));
        }

        let model = ModelConfig {
            artifacts_dir: self
                .artifacts_dir
                .ok_or(ConfigError::MissingParameter("artifacts_dir"))?,
            samples: self.samples.unwrap_or(model_defaults.samples),
            trees: self.trees.unwrap_or(model_defaults.trees),
            max_depth: self.max_depth.unwrap_or(model_defaults.max_depth),
            test_fraction: self.test_fraction.unwrap_or(model_defaults.test_fraction),
            seed: self.seed.unwrap_or(model_defaults.seed),
            noise_std: self.noise_std.unwrap_or(model_defaults.noise_std),
            lock_timeout: self.lock_timeout.unwrap_or(model_defaults.lock_timeout),
        };
        model.validate()?;

        let max_length = self.max_length.unwrap_or(10_000);
        if max_length == 0 {
            return Err(invalid("max_length", "must be at least 1"));
        }

        let defaults = self.defaults.unwrap_or_default();
        if defaults.length == 0 || defaults.length > max_length {
            return Err(invalid(
                "defaults.length",
                format!("must lie in 1..={}", max_length),
            ));
        }
        if !defaults.temperature.is_finite() || !defaults.pressure.is_finite() {
            return Err(invalid(
                "defaults",
                "temperature and pressure must be finite",
            ));
        }

        Ok(SimulationConfig {
            optimizer,
            model,
            max_length,
            defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_defaults_around_required_directory() {
        let config = SimulationConfigBuilder::new()
            .artifacts_dir(PathBuf::from("/tmp/qw"))
            .build()
            .unwrap();
        assert_eq!(config.optimizer, OptimizerConfig::default());
        assert_eq!(config.model.trees, 200);
        assert_eq!(config.model.lock_path(), PathBuf::from("/tmp/qw/.bootstrap.lock"));
        assert_eq!(config.max_length, 10_000);
        assert_eq!(config.defaults.length, 10);
    }

    #[test]
    fn builder_requires_artifacts_dir() {
        assert_eq!(
            SimulationConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("artifacts_dir"))
        );
    }

    #[test]
    fn builder_rejects_out_of_range_values() {
        let base = || SimulationConfigBuilder::new().artifacts_dir(PathBuf::from("m"));
        assert!(matches!(
            base().test_fraction(1.0).build(),
            Err(ConfigError::InvalidValue { parameter: "test_fraction", .. })
        ));
        assert!(matches!(
            base().trees(0).build(),
            Err(ConfigError::InvalidValue { parameter: "trees", .. })
        ));
        assert!(matches!(
            base().max_length(5).build(),
            Err(ConfigError::InvalidValue { parameter: "defaults.length", .. })
        ));
        assert!(matches!(
            base().step_size(f64::NAN).build(),
            Err(ConfigError::InvalidValue { parameter: "step_size", .. })
        ));
    }

    #[test]
    fn forest_params_follow_model_settings() {
        let model = ModelConfig {
            trees: 12,
            max_depth: 4,
            seed: 9,
            ..ModelConfig::default()
        };
        let params = model.forest_params();
        assert_eq!(params.n_trees, 12);
        assert_eq!(params.tree.max_depth, 4);
        assert_eq!(params.seed, 9);
        assert!(params.bootstrap);
    }
}
