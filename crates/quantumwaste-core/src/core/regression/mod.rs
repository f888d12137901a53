//! # Regression Module
//!
//! The supervised-learning primitives behind the recycling-difficulty predictor.
//!
//! ## Key Components
//!
//! - [`scaler`] - Per-column standardization to zero mean and unit variance
//! - [`tree`] - CART regression trees with a squared-error split criterion
//! - [`forest`] - Bootstrap-aggregated ensembles of trees with impurity-based importances
//! - [`metrics`] - Holdout scoring (R², mean squared error)
//!
//! All models operate on a [`Dataset`], a dense row-major feature matrix with one target per
//! row. Trained models derive `serde` traits so the engine can persist them as artifacts.

pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod tree;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Cannot fit a model on an empty dataset")]
    EmptyDataset,

    #[error("Expected {expected} features per row, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Dataset has {rows} rows but {targets} targets")]
    TargetCountMismatch { rows: usize, targets: usize },

    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Dense row-major feature matrix with one regression target per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    n_features: usize,
    features: Vec<f64>,
    targets: Vec<f64>,
}

impl Dataset {
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            features: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn with_capacity(n_features: usize, rows: usize) -> Self {
        Self {
            n_features,
            features: Vec::with_capacity(rows * n_features),
            targets: Vec::with_capacity(rows),
        }
    }

    /// Builds a dataset from a flat row-major buffer.
    pub fn from_parts(
        n_features: usize,
        features: Vec<f64>,
        targets: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if n_features == 0 {
            return Err(ModelError::InvalidHyperparameter(
                "a dataset needs at least one feature column".to_string(),
            ));
        }
        if features.len() % n_features != 0 {
            return Err(ModelError::DimensionMismatch {
                expected: n_features,
                found: features.len() % n_features,
            });
        }
        let rows = features.len() / n_features;
        if rows != targets.len() {
            return Err(ModelError::TargetCountMismatch {
                rows,
                targets: targets.len(),
            });
        }
        Ok(Self {
            n_features,
            features,
            targets,
        })
    }

    pub fn push(&mut self, row: &[f64], target: f64) -> Result<(), ModelError> {
        if row.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }
        self.features.extend_from_slice(row);
        self.targets.push(target);
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.n_features;
        &self.features[start..start + self.n_features]
    }

    #[inline]
    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.features[row * self.n_features + feature]
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.features.chunks_exact(self.n_features)
    }

    /// Copies the given rows, in order, into a new dataset.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut subset = Self::with_capacity(self.n_features, indices.len());
        for &i in indices {
            subset.features.extend_from_slice(self.row(i));
            subset.targets.push(self.targets[i]);
        }
        subset
    }

    /// Applies `f` to every row, keeping targets unchanged.
    pub fn map_rows<F>(&self, mut f: F) -> Result<Self, ModelError>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>, ModelError>,
    {
        let mut mapped = Vec::with_capacity(self.features.len());
        for row in self.rows() {
            mapped.extend(f(row)?);
        }
        Self::from_parts(self.n_features, mapped, self.targets.clone())
    }
}
