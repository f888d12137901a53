use super::error::EngineError;
use crate::core::models::polymer::{
    CompositionMode, MAX_BOND_STRENGTH, MIN_BOND_STRENGTH, Monomer, PolymerChain,
};
use rand::Rng;
use tracing::debug;

/// Generates a chain of `length` monomers with uniformly drawn bond strengths.
///
/// # Errors
///
/// Returns [`EngineError::InvalidArgument`] if `length` is zero.
pub fn generate_polymer(
    length: usize,
    mode: CompositionMode,
    rng: &mut impl Rng,
) -> Result<PolymerChain, EngineError> {
    if length < 1 {
        return Err(EngineError::InvalidArgument(
            "polymer length must be at least 1".to_string(),
        ));
    }

    let composition: Vec<Monomer> = match mode {
        CompositionMode::Uniform => vec![Monomer::A; length],
        CompositionMode::Random => (0..length)
            .map(|_| Monomer::ALL[rng.gen_range(0..Monomer::ALL.len())])
            .collect(),
    };

    let bond_strengths: Vec<f64> = (1..length)
        .map(|_| rng.gen_range(MIN_BOND_STRENGTH..MAX_BOND_STRENGTH))
        .collect();

    let chain = PolymerChain::new(composition, bond_strengths)?;
    debug!(length, %mode, "Generated polymer chain.");
    Ok(chain)
}
