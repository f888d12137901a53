//! # Quantum Module
//!
//! A small pure-state quantum circuit simulator used as the objective function of the
//! parameter optimizer.
//!
//! ## Overview
//!
//! The simulator keeps the full `2^n` complex amplitude vector of an `n`-qubit register and
//! applies gates in place. It supports exactly what the optimizer needs:
//!
//! - [`gates`] - Single-qubit rotations about X, Y and Z, and the controlled-NOT gate
//! - [`state`] - The amplitude vector, gate application and Pauli-Z expectation values
//! - [`circuit`] - Ordered gate sequences, the [`circuit::ParameterizedCircuit`] seam and the
//!   fixed four-qubit polymer ansatz
//!
//! Qubit `0` is the most significant bit of a basis-state index, so `|q0 q1 q2 q3>` maps to
//! index `q0·8 + q1·4 + q2·2 + q3`.

pub mod circuit;
pub mod gates;
pub mod state;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuantumError {
    #[error("Cannot simulate a register with zero qubits")]
    EmptyRegister,

    #[error("Register of {0} qubits is too large to simulate")]
    RegisterTooLarge(usize),

    #[error("Qubit index {qubit} is out of range for a {num_qubits}-qubit register")]
    QubitOutOfRange { qubit: usize, num_qubits: usize },

    #[error("Control and target of a controlled gate must differ (both are qubit {0})")]
    ControlIsTarget(usize),

    #[error("Circuit produced a non-finite expectation value")]
    NonFiniteExpectation,
}
