use super::config::OptimizerConfig;
use super::error::EngineError;
use crate::core::quantum::QuantumError;
use crate::core::quantum::circuit::{NUM_PARAMS, ParameterizedCircuit, PolymerAnsatz};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use tracing::{instrument, trace};

/// Trained circuit parameters, serialized as a plain three-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptimizedParameters(pub [f64; NUM_PARAMS]);

impl OptimizedParameters {
    pub fn values(&self) -> &[f64; NUM_PARAMS] {
        &self.0
    }
}

/// Optimizes the polymer ansatz for a chain of `target_length` monomers.
pub fn optimize(
    target_length: usize,
    config: &OptimizerConfig,
    rng: &mut impl Rng,
) -> Result<OptimizedParameters, EngineError> {
    optimize_with(&PolymerAnsatz, target_length, config, rng)
}

/// Runs `config.iterations` steps of stochastic gradient descent on `circuit`.
///
/// Parameters start at independent `U[0, 1)` draws. Each step samples a fresh input vector
/// from `U[0, 1)^3 * target_length`, computes the exact gradient of the expectation by the
/// parameter-shift rule and moves the parameters against it.
///
/// # Errors
///
/// Returns [`EngineError::InvalidArgument`] if `target_length` is zero and
/// [`EngineError::Computation`] if a step produces a non-finite parameter.
#[instrument(level = "debug", skip(circuit, config, rng), fields(iterations = config.iterations))]
pub fn optimize_with<C: ParameterizedCircuit>(
    circuit: &C,
    target_length: usize,
    config: &OptimizerConfig,
    rng: &mut impl Rng,
) -> Result<OptimizedParameters, EngineError> {
    if target_length < 1 {
        return Err(EngineError::InvalidArgument(
            "target length must be at least 1".to_string(),
        ));
    }
    let scale = target_length as f64;

    let mut params: [f64; NUM_PARAMS] = std::array::from_fn(|_| rng.gen_range(0.0..1.0));
    let mut last_inputs = None;

    for iteration in 0..config.iterations {
        let inputs: [f64; NUM_PARAMS] = std::array::from_fn(|_| rng.gen_range(0.0..1.0) * scale);
        let gradient = parameter_shift_gradient(circuit, &inputs, &params)?;

        for (p, g) in params.iter_mut().zip(gradient) {
            *p -= config.step_size * g;
        }
        if params.iter().any(|p| !p.is_finite()) {
            return Err(EngineError::Computation(format!(
                "optimizer produced a non-finite parameter at iteration {}",
                iteration
            )));
        }
        last_inputs = Some(inputs);
    }

    if let Some(inputs) = last_inputs {
        let objective = circuit.expectation(&inputs, &params)?;
        trace!(objective, ?params, "Optimization finished.");
    }

    Ok(OptimizedParameters(params))
}

/// Exact gradient of the circuit expectation with respect to each trainable parameter:
/// `[f(θ + π/2·eᵢ) - f(θ - π/2·eᵢ)] / 2`.
pub fn parameter_shift_gradient<C: ParameterizedCircuit>(
    circuit: &C,
    inputs: &[f64; NUM_PARAMS],
    params: &[f64; NUM_PARAMS],
) -> Result<[f64; NUM_PARAMS], QuantumError> {
    let mut gradient = [0.0; NUM_PARAMS];
    for (i, slot) in gradient.iter_mut().enumerate() {
        let mut plus = *params;
        let mut minus = *params;
        plus[i] += FRAC_PI_2;
        minus[i] -= FRAC_PI_2;
        *slot = (circuit.expectation(inputs, &plus)? - circuit.expectation(inputs, &minus)?) / 2.0;
    }
    Ok(gradient)
}
