use super::QuantumError;
use super::gates::Gate;
use super::state::StateVector;
use std::fmt;

/// Number of trainable parameters (and classical inputs) of the polymer ansatz.
pub const NUM_PARAMS: usize = 3;

/// Register width of the polymer ansatz.
pub const ANSATZ_QUBITS: usize = 4;

/// Qubit whose Pauli-Z expectation is the ansatz output.
pub const READOUT_QUBIT: usize = 3;

/// An ordered gate sequence applied to a fresh `|0...0>` register.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    num_qubits: usize,
    gates: Vec<Gate>,
}

impl Circuit {
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
        }
    }

    pub fn gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn rx(self, qubit: usize, theta: f64) -> Self {
        self.gate(Gate::rx(qubit, theta))
    }

    pub fn ry(self, qubit: usize, theta: f64) -> Self {
        self.gate(Gate::ry(qubit, theta))
    }

    pub fn rz(self, qubit: usize, theta: f64) -> Self {
        self.gate(Gate::rz(qubit, theta))
    }

    pub fn cnot(self, control: usize, target: usize) -> Self {
        self.gate(Gate::cnot(control, target))
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Evolves `|0...0>` through every gate in order and returns the final state.
    pub fn run(&self) -> Result<StateVector, QuantumError> {
        let mut state = StateVector::zero(self.num_qubits)?;
        for gate in &self.gates {
            state.apply(gate)?;
        }
        Ok(state)
    }

    pub fn expectation_z(&self, qubit: usize) -> Result<f64, QuantumError> {
        self.run()?.expectation_z(qubit)
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Circuit on {} qubits:", self.num_qubits)?;
        for (i, gate) in self.gates.iter().enumerate() {
            writeln!(f, "  {:>2}: {}", i, gate)?;
        }
        Ok(())
    }
}

/// A circuit family mapping classical inputs and trainable parameters to a scalar
/// expectation value.
///
/// Every trainable parameter must enter the circuit only as the angle of a single rotation
/// gate, which is what makes the parameter-shift gradient exact.
pub trait ParameterizedCircuit {
    fn expectation(
        &self,
        inputs: &[f64; NUM_PARAMS],
        params: &[f64; NUM_PARAMS],
    ) -> Result<f64, QuantumError>;
}

/// Fixed four-qubit ansatz: input rotations on qubits 0-2, a CNOT ladder, trainable rotations
/// on qubits 0-2 and a final CNOT onto the readout qubit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolymerAnsatz;

impl PolymerAnsatz {
    pub fn build(&self, inputs: &[f64; NUM_PARAMS], params: &[f64; NUM_PARAMS]) -> Circuit {
        Circuit::new(ANSATZ_QUBITS)
            .rx(0, inputs[0])
            .ry(1, inputs[1])
            .rz(2, inputs[2])
            .cnot(0, 1)
            .cnot(1, 2)
            .rx(0, params[0])
            .ry(1, params[1])
            .rz(2, params[2])
            .cnot(2, 3)
    }
}

impl ParameterizedCircuit for PolymerAnsatz {
    fn expectation(
        &self,
        inputs: &[f64; NUM_PARAMS],
        params: &[f64; NUM_PARAMS],
    ) -> Result<f64, QuantumError> {
        self.build(inputs, params).expectation_z(READOUT_QUBIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-10;

    #[test]
    fn empty_circuit_leaves_register_in_ground_state() {
        let circuit = Circuit::new(2);
        assert!((circuit.expectation_z(0).unwrap() - 1.0).abs() < TOLERANCE);
        assert!((circuit.expectation_z(1).unwrap() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn builder_preserves_gate_order() {
        let circuit = Circuit::new(2).rx(0, 0.1).cnot(0, 1).rz(1, 0.2);
        assert_eq!(
            circuit.gates(),
            &[Gate::rx(0, 0.1), Gate::cnot(0, 1), Gate::rz(1, 0.2)]
        );
    }

    #[test]
    fn invalid_gate_fails_the_run() {
        let circuit = Circuit::new(2).rx(4, 0.1);
        assert!(matches!(
            circuit.run(),
            Err(QuantumError::QubitOutOfRange { qubit: 4, .. })
        ));
    }

    #[test]
    fn ansatz_has_nine_gates_on_four_qubits() {
        let circuit = PolymerAnsatz.build(&[0.1, 0.2, 0.3], &[0.4, 0.5, 0.6]);
        assert_eq!(circuit.num_qubits(), ANSATZ_QUBITS);
        assert_eq!(circuit.gates().len(), 9);
        assert_eq!(circuit.gates()[8], Gate::cnot(2, 3));
    }

    #[test]
    fn ansatz_expectation_is_bounded() {
        for k in 0..20 {
            let x = k as f64 * 0.37;
            let value = PolymerAnsatz
                .expectation(&[x, 2.0 * x, 3.0 * x], &[0.5, x, 1.5])
                .unwrap();
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn ansatz_readout_follows_control_chain_for_basis_inputs() {
        // RX(pi) on q0 flips it; the CNOT ladder carries the flip down to the readout qubit.
        let value = PolymerAnsatz
            .expectation(&[PI, 0.0, 0.0], &[0.0, 0.0, 0.0])
            .unwrap();
        assert!((value + 1.0).abs() < TOLERANCE);

        let value = PolymerAnsatz
            .expectation(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0])
            .unwrap();
        assert!((value - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn display_lists_every_gate() {
        let rendered = Circuit::new(2).rx(0, 1.0).cnot(0, 1).to_string();
        assert!(rendered.contains("Circuit on 2 qubits"));
        assert!(rendered.contains("RX(1.0000) q0"));
        assert!(rendered.contains("CNOT q0 -> q1"));
    }
}
