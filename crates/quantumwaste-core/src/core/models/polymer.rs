use super::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bond strengths are drawn from `[MIN_BOND_STRENGTH, MAX_BOND_STRENGTH)`.
pub const MIN_BOND_STRENGTH: f64 = 0.5;
pub const MAX_BOND_STRENGTH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Monomer {
    A,
    B,
    C,
}

impl Monomer {
    pub const ALL: [Monomer; 3] = [Monomer::A, Monomer::B, Monomer::C];

    pub fn symbol(self) -> char {
        match self {
            Monomer::A => 'A',
            Monomer::B => 'B',
            Monomer::C => 'C',
        }
    }
}

impl fmt::Display for Monomer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How monomer labels are assigned along the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    /// Every position drawn independently and uniformly from {A, B, C}.
    #[default]
    Random,
    /// Every position is `A`.
    Uniform,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid composition mode '{0}'. Expected 'random' or 'uniform'.")]
pub struct ParseCompositionModeError(pub String);

impl FromStr for CompositionMode {
    type Err = ParseCompositionModeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(CompositionMode::Random),
            "uniform" => Ok(CompositionMode::Uniform),
            other => Err(ParseCompositionModeError(other.to_string())),
        }
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CompositionMode::Random => "random",
                CompositionMode::Uniform => "uniform",
            }
        )
    }
}

/// Counts of each monomer type in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositionCounts {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

impl CompositionCounts {
    pub fn total(&self) -> usize {
        self.a + self.b + self.c
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PolymerError {
    #[error("Polymer length must be at least 1 (got {0})")]
    EmptyChain(usize),

    #[error("Chain of length {length} needs {expected} bond strengths, found {found}")]
    BondCount {
        length: usize,
        expected: usize,
        found: usize,
    },

    #[error("Bond strength at position {index} is not a positive finite number: {value}")]
    InvalidBondStrength { index: usize, value: f64 },
}

/// A simulated linear polymer: `length` monomers joined by `length - 1` bonds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolymerChain {
    length: usize,
    composition: Vec<Monomer>,
    bond_strengths: Vec<f64>,
}

impl PolymerChain {
    /// Assembles a chain from its parts, checking the length invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`PolymerError`] if the composition is empty or the bond list does not hold
    /// exactly `length - 1` positive, finite entries.
    pub fn new(
        composition: Vec<Monomer>,
        bond_strengths: Vec<f64>,
    ) -> Result<Self, PolymerError> {
        let length = composition.len();
        if length == 0 {
            return Err(PolymerError::EmptyChain(0));
        }
        if bond_strengths.len() != length - 1 {
            return Err(PolymerError::BondCount {
                length,
                expected: length - 1,
                found: bond_strengths.len(),
            });
        }
        if let Some((index, &value)) = bond_strengths
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(PolymerError::InvalidBondStrength { index, value });
        }

        Ok(Self {
            length,
            composition,
            bond_strengths,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn composition(&self) -> &[Monomer] {
        &self.composition
    }

    pub fn bond_strengths(&self) -> &[f64] {
        &self.bond_strengths
    }

    pub fn composition_counts(&self) -> CompositionCounts {
        self.composition
            .iter()
            .fold(CompositionCounts::default(), |mut counts, monomer| {
                match monomer {
                    Monomer::A => counts.a += 1,
                    Monomer::B => counts.b += 1,
                    Monomer::C => counts.c += 1,
                }
                counts
            })
    }

    /// Mean bond strength; a single-monomer chain has no bonds and reports `0.0`.
    pub fn average_bond_strength(&self) -> f64 {
        if self.bond_strengths.is_empty() {
            return 0.0;
        }
        self.bond_strengths.iter().sum::<f64>() / self.bond_strengths.len() as f64
    }

    /// Derives the predictor inputs, merging in the environmental conditions.
    pub fn features(&self, temperature: f64, pressure: f64) -> FeatureVector {
        let counts = self.composition_counts();
        FeatureVector {
            length: self.length as f64,
            composition_a_count: counts.a as f64,
            composition_b_count: counts.b as f64,
            composition_c_count: counts.c as f64,
            avg_bond_strength: self.average_bond_strength(),
            temperature,
            pressure,
        }
    }

    /// Composition rendered as a compact string such as `"ABCA"`.
    pub fn sequence(&self) -> String {
        self.composition.iter().map(|m| m.symbol()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(sequence: &str, bonds: Vec<f64>) -> PolymerChain {
        let composition = sequence
            .chars()
            .map(|c| match c {
                'A' => Monomer::A,
                'B' => Monomer::B,
                _ => Monomer::C,
            })
            .collect();
        PolymerChain::new(composition, bonds).unwrap()
    }

    #[test]
    fn composition_mode_parses_only_known_values() {
        assert_eq!("random".parse::<CompositionMode>(), Ok(CompositionMode::Random));
        assert_eq!("uniform".parse::<CompositionMode>(), Ok(CompositionMode::Uniform));
        assert_eq!(
            "Uniform".parse::<CompositionMode>(),
            Err(ParseCompositionModeError("Uniform".to_string()))
        );
    }

    #[test]
    fn composition_mode_defaults_to_random() {
        assert_eq!(CompositionMode::default(), CompositionMode::Random);
        assert_eq!(CompositionMode::Uniform.to_string(), "uniform");
    }

    #[test]
    fn counts_and_average_bond_strength_are_derived_from_contents() {
        let polymer = chain("ABCAA", vec![0.5, 1.0, 1.5, 1.0]);
        assert_eq!(
            polymer.composition_counts(),
            CompositionCounts { a: 3, b: 1, c: 1 }
        );
        assert!((polymer.average_bond_strength() - 1.0).abs() < 1e-12);
        assert_eq!(polymer.sequence(), "ABCAA");
    }

    #[test]
    fn single_monomer_chain_reports_zero_bond_strength() {
        let polymer = chain("B", vec![]);
        assert_eq!(polymer.average_bond_strength(), 0.0);
        let features = polymer.features(25.0, 1.0);
        assert_eq!(features.length, 1.0);
        assert_eq!(features.composition_b_count, 1.0);
        assert_eq!(features.avg_bond_strength, 0.0);
    }

    #[test]
    fn features_merge_environmental_conditions() {
        let features = chain("AAB", vec![1.0, 1.2]).features(80.0, 3.5);
        assert_eq!(features.temperature, 80.0);
        assert_eq!(features.pressure, 3.5);
        assert_eq!(features.composition_a_count, 2.0);
        assert!((features.avg_bond_strength - 1.1).abs() < 1e-12);
    }

    #[test]
    fn new_rejects_inconsistent_parts() {
        assert_eq!(
            PolymerChain::new(vec![], vec![]),
            Err(PolymerError::EmptyChain(0))
        );
        assert!(matches!(
            PolymerChain::new(vec![Monomer::A, Monomer::B], vec![]),
            Err(PolymerError::BondCount {
                expected: 1,
                found: 0,
                ..
            })
        ));
        assert!(matches!(
            PolymerChain::new(vec![Monomer::A, Monomer::B], vec![-1.0]),
            Err(PolymerError::InvalidBondStrength { index: 0, .. })
        ));
    }

    #[test]
    fn serializes_with_letter_labels() {
        let json = serde_json::to_value(chain("AB", vec![1.25])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "length": 2,
                "composition": ["A", "B"],
                "bond_strengths": [1.25]
            })
        );
    }
}
