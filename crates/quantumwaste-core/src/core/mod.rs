//! # Core Module
//!
//! Fundamental building blocks shared by the engine: data models, the quantum circuit
//! simulator, regression primitives and artifact persistence.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Polymer chains, monomers and the predictor feature vector
//! - **Quantum Simulation** ([`quantum`]) - Pure-state simulator, rotation/CNOT gates, circuits
//! - **Regression** ([`regression`]) - Standard scaling, CART regression trees, random forests
//! - **Persistence** ([`io`]) - Versioned binary artifacts for trained models
//!
//! Nothing in this module holds process-wide state; the engine owns all lifecycles.

pub mod io;
pub mod models;
pub mod quantum;
pub mod regression;
