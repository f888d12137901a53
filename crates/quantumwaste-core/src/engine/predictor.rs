use super::config::{MODEL_FILE_NAME, ModelConfig, SCALER_FILE_NAME};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::training::{TrainingReport, train_model};
use crate::core::io::artifact::{Artifact, ArtifactError};
use crate::core::models::features::{FEATURE_LABELS, FeatureVector, NUM_FEATURES};
use crate::core::regression::forest::RandomForest;
use crate::core::regression::scaler::StandardScaler;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions, TryLockError};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Normalized importance per feature, keyed by display label in model column order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportances(Vec<(&'static str, f64)>);

impl FeatureImportances {
    fn from_weights(weights: &[f64]) -> Self {
        Self(FEATURE_LABELS.iter().copied().zip(weights.iter().copied()).collect())
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| *l == label).map(|&(_, w)| w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, w)| w).sum()
    }
}

impl Serialize for FeatureImportances {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, weight) in &self.0 {
            map.serialize_entry(label, weight)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub difficulty: f64,
    pub importances: FeatureImportances,
}

/// A fitted scaler and forest pair that scores polymer feature vectors.
///
/// Immutable once built, so a single instance can be shared across request handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyPredictor {
    scaler: StandardScaler,
    forest: RandomForest,
}

impl DifficultyPredictor {
    pub fn from_parts(scaler: StandardScaler, forest: RandomForest) -> Result<Self, EngineError> {
        for (what, width) in [("scaler", scaler.n_features()), ("model", forest.n_features())] {
            if width != NUM_FEATURES {
                return Err(EngineError::InvalidArgument(format!(
                    "{} expects {} features, the predictor needs {}",
                    what, width, NUM_FEATURES
                )));
            }
        }
        Ok(Self { scaler, forest })
    }

    /// Trains a fresh predictor on synthetic data without touching the filesystem.
    pub fn train(
        config: &ModelConfig,
        reporter: &ProgressReporter,
    ) -> Result<(Self, TrainingReport), EngineError> {
        let trained = train_model(config, reporter)?;
        let predictor = Self::from_parts(trained.scaler, trained.forest)?;
        Ok((predictor, trained.report))
    }

    pub fn artifacts_exist(dir: &Path) -> bool {
        dir.join(MODEL_FILE_NAME).is_file() && dir.join(SCALER_FILE_NAME).is_file()
    }

    pub fn load(dir: &Path) -> Result<Self, EngineError> {
        let scaler = StandardScaler::read_from_path(dir.join(SCALER_FILE_NAME))?;
        let forest = RandomForest::read_from_path(dir.join(MODEL_FILE_NAME))?;
        debug!(dir = %dir.display(), trees = forest.trees().len(), "Loaded predictor artifacts.");
        Self::from_parts(scaler, forest)
    }

    pub fn save(&self, dir: &Path) -> Result<(), EngineError> {
        fs::create_dir_all(dir).map_err(|e| ArtifactError::io(dir, e))?;
        self.forest.write_to_path(dir.join(MODEL_FILE_NAME))?;
        self.scaler.write_to_path(dir.join(SCALER_FILE_NAME))?;
        Ok(())
    }

    /// Loads the persisted predictor, training and persisting one first if none exists.
    ///
    /// Both paths run under the artifact directory's lock, so a concurrent [`retrain`] or
    /// bootstrap never exposes a model and scaler from different trainings. A process that finds
    /// the lock held polls until it is released, failing with [`ArtifactError::LockTimeout`]
    /// after `config.lock_timeout`.
    ///
    /// [`retrain`]: Self::retrain
    #[instrument(skip_all, fields(dir = %config.artifacts_dir.display()))]
    pub fn bootstrap(config: &ModelConfig, reporter: &ProgressReporter) -> Result<Self, EngineError> {
        let dir = config.artifacts_dir.as_path();
        Self::with_artifact_lock(config, reporter, || {
            if Self::artifacts_exist(dir) {
                info!("Loading existing predictor artifacts.");
                let predictor = Self::load(dir)?;
                reporter.report(Progress::Message(format!(
                    "Loaded predictor artifacts from {}",
                    dir.display()
                )));
                return Ok(predictor);
            }
            info!("No predictor artifacts found; training on synthetic data.");
            Ok(Self::train_and_save(config, reporter)?.0)
        })
    }

    /// Trains a fresh predictor and replaces any persisted artifacts, holding the same lock as
    /// [`bootstrap`](Self::bootstrap).
    #[instrument(skip_all, fields(dir = %config.artifacts_dir.display()))]
    pub fn retrain(
        config: &ModelConfig,
        reporter: &ProgressReporter,
    ) -> Result<(Self, TrainingReport), EngineError> {
        Self::with_artifact_lock(config, reporter, || Self::train_and_save(config, reporter))
    }

    fn train_and_save(
        config: &ModelConfig,
        reporter: &ProgressReporter,
    ) -> Result<(Self, TrainingReport), EngineError> {
        let (predictor, report) = Self::train(config, reporter)?;
        predictor.save(&config.artifacts_dir)?;
        info!(r2 = report.r2, mse = report.mse, "Predictor trained and saved.");
        reporter.report(Progress::Message(format!(
            "Saved predictor artifacts to {}",
            config.artifacts_dir.display()
        )));
        Ok((predictor, report))
    }

    fn with_artifact_lock<T>(
        config: &ModelConfig,
        reporter: &ProgressReporter,
        work: impl FnOnce() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let dir = config.artifacts_dir.as_path();
        fs::create_dir_all(dir).map_err(|e| ArtifactError::io(dir, e))?;
        let lock_path = config.lock_path();
        let deadline = Instant::now() + config.lock_timeout;
        let mut waiting_reported = false;

        loop {
            if let Some(_guard) = ArtifactLock::try_acquire(&lock_path)? {
                return work();
            }

            if Instant::now() >= deadline {
                return Err(ArtifactError::LockTimeout { path: lock_path }.into());
            }
            if !waiting_reported {
                info!(lock = %lock_path.display(), "Another process holds the artifact lock; waiting.");
                reporter.report(Progress::Message(
                    "Waiting for another process to finish training...".to_string(),
                ));
                waiting_reported = true;
            }
            thread::sleep(LOCK_POLL_INTERVAL);
        }
    }

    /// Predicts the recycling difficulty of one polymer along with the model's global feature
    /// importances.
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, EngineError> {
        features.validate()?;
        let row = self.scaler.transform_row(&features.to_array())?;
        let difficulty = self.forest.predict(&row)?;
        if !difficulty.is_finite() {
            return Err(EngineError::Computation(
                "model produced a non-finite difficulty".to_string(),
            ));
        }
        Ok(Prediction {
            difficulty,
            importances: self.importances(),
        })
    }

    /// Like [`predict`](Self::predict), for name-keyed feature maps.
    pub fn predict_map(&self, features: &HashMap<String, f64>) -> Result<Prediction, EngineError> {
        self.predict(&FeatureVector::from_map(features)?)
    }

    pub fn importances(&self) -> FeatureImportances {
        FeatureImportances::from_weights(self.forest.feature_importances())
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}

/// Exclusive advisory lock on the artifact directory's lock file.
///
/// The operating system drops the lock when the handle closes, including when the holding
/// process dies, so a leftover lock file never blocks later runs. The file itself stays in place.
struct ArtifactLock {
    _file: File,
}

impl ArtifactLock {
    fn try_acquire(path: &Path) -> Result<Option<Self>, ArtifactError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| ArtifactError::io(path, e))?;
        match file.try_lock() {
            Ok(()) => Ok(Some(Self { _file: file })),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(e)) => Err(ArtifactError::io(path, e)),
        }
    }
}
