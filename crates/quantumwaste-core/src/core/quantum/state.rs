use super::QuantumError;
use super::gates::{Gate, Matrix2, rotation_matrix};
use num_complex::Complex;

/// Largest register the simulator accepts; `2^20` amplitudes is already 16 MiB.
pub const MAX_QUBITS: usize = 20;

/// Pure state of an `n`-qubit register stored as `2^n` complex amplitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex<f64>>,
}

impl StateVector {
    /// Creates the `|0...0>` state of `num_qubits` qubits.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::EmptyRegister`] for zero qubits and
    /// [`QuantumError::RegisterTooLarge`] above [`MAX_QUBITS`].
    pub fn zero(num_qubits: usize) -> Result<Self, QuantumError> {
        if num_qubits == 0 {
            return Err(QuantumError::EmptyRegister);
        }
        if num_qubits > MAX_QUBITS {
            return Err(QuantumError::RegisterTooLarge(num_qubits));
        }

        let mut amplitudes = vec![Complex::new(0.0, 0.0); 1usize << num_qubits];
        amplitudes[0] = Complex::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn amplitudes(&self) -> &[Complex<f64>] {
        &self.amplitudes
    }

    /// Total probability mass; stays at 1 under unitary evolution.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Probability of measuring the basis state with the given index.
    pub fn probability(&self, basis_index: usize) -> Option<f64> {
        self.amplitudes.get(basis_index).map(|a| a.norm_sqr())
    }

    pub fn apply(&mut self, gate: &Gate) -> Result<(), QuantumError> {
        match *gate {
            Gate::Rotation { axis, qubit, theta } => {
                self.apply_single_qubit(qubit, &rotation_matrix(axis, theta))
            }
            Gate::Cnot { control, target } => self.apply_cnot(control, target),
        }
    }

    /// Applies a 2x2 unitary to `qubit`, pairing every basis state with the one that differs
    /// only at that qubit.
    pub fn apply_single_qubit(&mut self, qubit: usize, matrix: &Matrix2) -> Result<(), QuantumError> {
        let mask = self.qubit_mask(qubit)?;
        let lower_mask = mask - 1;

        for i in 0..self.amplitudes.len() / 2 {
            let i0 = ((i & !lower_mask) << 1) | (i & lower_mask);
            let i1 = i0 | mask;

            let a0 = self.amplitudes[i0];
            let a1 = self.amplitudes[i1];
            self.amplitudes[i0] = matrix[0][0] * a0 + matrix[0][1] * a1;
            self.amplitudes[i1] = matrix[1][0] * a0 + matrix[1][1] * a1;
        }
        Ok(())
    }

    pub fn apply_cnot(&mut self, control: usize, target: usize) -> Result<(), QuantumError> {
        if control == target {
            return Err(QuantumError::ControlIsTarget(control));
        }
        let control_mask = self.qubit_mask(control)?;
        let target_mask = self.qubit_mask(target)?;

        for i in 0..self.amplitudes.len() {
            if i & control_mask != 0 && i & target_mask == 0 {
                self.amplitudes.swap(i, i | target_mask);
            }
        }
        Ok(())
    }

    /// Expectation value of Pauli-Z on `qubit`, in `[-1, 1]`.
    pub fn expectation_z(&self, qubit: usize) -> Result<f64, QuantumError> {
        let mask = self.qubit_mask(qubit)?;
        let value: f64 = self
            .amplitudes
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let p = a.norm_sqr();
                if i & mask == 0 { p } else { -p }
            })
            .sum();

        if !value.is_finite() {
            return Err(QuantumError::NonFiniteExpectation);
        }
        Ok(value.clamp(-1.0, 1.0))
    }

    fn qubit_mask(&self, qubit: usize) -> Result<usize, QuantumError> {
        if qubit >= self.num_qubits {
            return Err(QuantumError::QubitOutOfRange {
                qubit,
                num_qubits: self.num_qubits,
            });
        }
        Ok(1 << (self.num_qubits - 1 - qubit))
    }
}
