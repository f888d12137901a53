//! # Core Models Module
//!
//! Data structures describing a simulated polymer and the features derived from it.
//!
//! ## Key Components
//!
//! - [`polymer`] - Monomer labels, composition modes and the [`polymer::PolymerChain`]
//! - [`features`] - The fixed-order [`features::FeatureVector`] consumed by the predictor
//!
//! Chains are created fresh per request and never persisted; feature vectors are consumed
//! once by the predictor.

pub mod features;
pub mod polymer;
