//! # QuantumWaste Core Library
//!
//! Computational core of the QuantumWaste recycling-difficulty service: a toy variational
//! quantum optimizer, a randomized polymer chain generator and a random-forest regressor
//! trained on synthetic polymer data.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`PolymerChain`, `FeatureVector`),
//!   the state-vector quantum simulator, the regression primitives (`StandardScaler`,
//!   `RegressionTree`, `RandomForest`) and binary artifact I/O.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the error taxonomy, the parameter
//!   optimizer, the polymer generator, synthetic training and the `DifficultyPredictor`
//!   with its one-time bootstrap.
//!
//! - **[`workflows`]: The Public API.** Request validation and the end-to-end `simulate`
//!   pipeline that ties the engine components together for a single request.
//!
//! Every function that draws random numbers takes the generator as an argument, so callers
//! decide between entropy-seeded and deterministic sources.

pub mod core;
pub mod engine;
pub mod workflows;
