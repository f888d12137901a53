use crate::core::models::polymer::{CompositionMode, PolymerChain};
use crate::engine::config::{RequestDefaults, SimulationConfig};
use crate::engine::error::EngineError;
use crate::engine::generator::generate_polymer;
use crate::engine::optimizer::{OptimizedParameters, optimize};
use crate::engine::predictor::{DifficultyPredictor, FeatureImportances};
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid input data: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn invalid(reason: impl Into<String>) -> SimulationError {
    SimulationError::InvalidInput(reason.into())
}

/// A validated simulation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationRequest {
    pub length: usize,
    pub composition: CompositionMode,
    pub temperature: f64,
    pub pressure: f64,
}

impl From<&RequestDefaults> for SimulationRequest {
    fn from(defaults: &RequestDefaults) -> Self {
        Self {
            length: defaults.length,
            composition: defaults.composition,
            temperature: defaults.temperature,
            pressure: defaults.pressure,
        }
    }
}

impl SimulationRequest {
    /// Parses and validates a raw request body.
    pub fn from_json_bytes(body: &[u8], config: &SimulationConfig) -> Result<Self, SimulationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| invalid(format!("body is not valid JSON: {}", e)))?;
        Self::from_json(&value, config)
    }

    /// Validates a decoded request body, filling absent fields from `config.defaults`.
    ///
    /// `length` must be a JSON integer in `1..=config.max_length`; booleans and floats are
    /// rejected. `composition` must be `"random"` or `"uniform"`. `temperature` and `pressure`
    /// must be finite numbers.
    pub fn from_json(value: &Value, config: &SimulationConfig) -> Result<Self, SimulationError> {
        let object = value
            .as_object()
            .ok_or_else(|| invalid("request body must be a JSON object"))?;
        let mut request = Self::from(&config.defaults);

        if let Some(length) = object.get("length") {
            request.length = parse_length(length, config.max_length)?;
        }
        if let Some(composition) = object.get("composition") {
            request.composition = composition
                .as_str()
                .ok_or_else(|| invalid("'composition' must be a string"))?
                .parse::<CompositionMode>()
                .map_err(|e| invalid(format!("{}", e)))?;
        }
        request.temperature = parse_number(object, "temperature")?.unwrap_or(request.temperature);
        request.pressure = parse_number(object, "pressure")?.unwrap_or(request.pressure);

        Ok(request)
    }
}

fn parse_length(value: &Value, max_length: usize) -> Result<usize, SimulationError> {
    let Value::Number(number) = value else {
        return Err(invalid("'length' must be an integer"));
    };
    if number.is_f64() {
        return Err(invalid("'length' must be an integer"));
    }
    match number.as_u64() {
        Some(n) if n >= 1 && n <= max_length as u64 => Ok(n as usize),
        _ => Err(invalid(format!(
            "'length' must lie between 1 and {}",
            max_length
        ))),
    }
}

fn parse_number(object: &Map<String, Value>, key: &str) -> Result<Option<f64>, SimulationError> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => match value.as_f64() {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(invalid(format!("'{}' must be a finite number", key))),
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub optimized_params: OptimizedParameters,
    pub polymer_structure: PolymerChain,
    pub recycling_difficulty: f64,
    pub feature_importances: FeatureImportances,
}

/// Runs one simulation: optimizes the circuit for the requested length, generates the polymer,
/// merges the environmental conditions into its features and predicts its recycling difficulty.
#[instrument(skip_all, name = "simulation_workflow", fields(length = request.length, composition = %request.composition))]
pub fn run(
    request: &SimulationRequest,
    predictor: &DifficultyPredictor,
    config: &SimulationConfig,
    rng: &mut impl Rng,
) -> Result<SimulationResult, SimulationError> {
    let optimized_params = optimize(request.length, &config.optimizer, rng)?;
    debug!(params = ?optimized_params.values(), "Circuit parameters optimized.");

    let polymer = generate_polymer(request.length, request.composition, rng)?;
    let features = polymer.features(request.temperature, request.pressure);
    let prediction = predictor.predict(&features)?;

    info!(
        difficulty = prediction.difficulty,
        sequence_length = polymer.length(),
        "Simulation complete."
    );

    Ok(SimulationResult {
        optimized_params,
        polymer_structure: polymer,
        recycling_difficulty: prediction.difficulty,
        feature_importances: prediction.importances,
    })
}
