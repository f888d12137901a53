use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const NUM_FEATURES: usize = 7;

/// Machine names of the predictor inputs, in model column order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "length",
    "composition_a_count",
    "composition_b_count",
    "composition_c_count",
    "avg_bond_strength",
    "temperature",
    "pressure",
];

/// Human-readable labels used when reporting feature importances.
pub const FEATURE_LABELS: [&str; NUM_FEATURES] = [
    "Length",
    "Composition A",
    "Composition B",
    "Composition C",
    "Avg Bond Strength",
    "Temperature",
    "Pressure",
];

/// Room temperature, used when a feature map omits `temperature`.
pub const DEFAULT_TEMPERATURE: f64 = 25.0;
/// Atmospheric pressure, used when a feature map omits `pressure`.
pub const DEFAULT_PRESSURE: f64 = 1.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureError {
    #[error("Missing required feature '{0}'")]
    Missing(&'static str),
    #[error("Feature '{0}' must be a finite number")]
    NonFinite(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub length: f64,
    pub composition_a_count: f64,
    pub composition_b_count: f64,
    pub composition_c_count: f64,
    pub avg_bond_strength: f64,
    pub temperature: f64,
    pub pressure: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.length,
            self.composition_a_count,
            self.composition_b_count,
            self.composition_c_count,
            self.avg_bond_strength,
            self.temperature,
            self.pressure,
        ]
    }

    pub fn from_array(values: [f64; NUM_FEATURES]) -> Self {
        let [
            length,
            composition_a_count,
            composition_b_count,
            composition_c_count,
            avg_bond_strength,
            temperature,
            pressure,
        ] = values;
        Self {
            length,
            composition_a_count,
            composition_b_count,
            composition_c_count,
            avg_bond_strength,
            temperature,
            pressure,
        }
    }

    /// Builds a vector from a name-keyed map.
    ///
    /// `length`, the three composition counts and `avg_bond_strength` are required;
    /// `temperature` and `pressure` fall back to [`DEFAULT_TEMPERATURE`] and
    /// [`DEFAULT_PRESSURE`]. Keys not in [`FEATURE_NAMES`] are ignored.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self, FeatureError> {
        let mut values = [0.0; NUM_FEATURES];
        for (slot, &name) in values.iter_mut().zip(FEATURE_NAMES.iter()) {
            let value = match (map.get(name), name) {
                (Some(&v), _) => v,
                (None, "temperature") => DEFAULT_TEMPERATURE,
                (None, "pressure") => DEFAULT_PRESSURE,
                (None, _) => return Err(FeatureError::Missing(name)),
            };
            if !value.is_finite() {
                return Err(FeatureError::NonFinite(name));
            }
            *slot = value;
        }
        Ok(Self::from_array(values))
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        match self
            .to_array()
            .iter()
            .zip(FEATURE_NAMES.iter())
            .find(|(v, _)| !v.is_finite())
        {
            Some((_, &name)) => Err(FeatureError::NonFinite(name)),
            None => Ok(()),
        }
    }
}
