//! # Workflows Module
//!
//! High-level entry points that tie the `engine` and `core` layers together into complete
//! procedures.
//!
//! - **Simulation Workflow** ([`simulate`]) - Validates a request, optimizes the circuit
//!   parameters, generates the polymer and predicts its recycling difficulty.

pub mod simulate;
