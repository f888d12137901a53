//! # Engine Module
//!
//! The computational services behind a simulation request: polymer generation, variational
//! parameter optimization and recycling-difficulty prediction.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Optimizer, model and request-default settings with a builder
//! - **Generation** ([`generator`]) - Random polymer chains of a requested length and composition
//! - **Optimization** ([`optimizer`]) - Parameter-shift gradient descent on the polymer ansatz
//! - **Training** ([`training`]) - Synthetic dataset generation and model fitting with holdout scoring
//! - **Prediction** ([`predictor`]) - The bootstrapped scaler/forest pair and its persisted artifacts
//! - **Progress Monitoring** ([`progress`]) - Callback-based reporting for long-running training
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! Every function that consumes randomness takes a caller-supplied `rand::Rng`, so production
//! code can seed from entropy while tests pass a seeded `StdRng`.

pub mod config;
pub mod error;
pub mod generator;
pub mod optimizer;
pub mod predictor;
pub mod progress;
pub mod training;
