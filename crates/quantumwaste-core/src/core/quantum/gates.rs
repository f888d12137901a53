use num_complex::Complex;
use std::fmt;

pub type Matrix2 = [[Complex<f64>; 2]; 2];

/// Rotation axis of a single-qubit rotation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A gate of the simulator's instruction set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    /// `exp(-i·θ/2·σ)` on `qubit`, where `σ` is the Pauli matrix of `axis`.
    Rotation { axis: Axis, qubit: usize, theta: f64 },
    /// Flips `target` when `control` is `|1>`.
    Cnot { control: usize, target: usize },
}

impl Gate {
    pub fn rx(qubit: usize, theta: f64) -> Self {
        Gate::Rotation {
            axis: Axis::X,
            qubit,
            theta,
        }
    }

    pub fn ry(qubit: usize, theta: f64) -> Self {
        Gate::Rotation {
            axis: Axis::Y,
            qubit,
            theta,
        }
    }

    pub fn rz(qubit: usize, theta: f64) -> Self {
        Gate::Rotation {
            axis: Axis::Z,
            qubit,
            theta,
        }
    }

    pub fn cnot(control: usize, target: usize) -> Self {
        Gate::Cnot { control, target }
    }

    /// Largest qubit index the gate touches.
    pub fn max_qubit(&self) -> usize {
        match *self {
            Gate::Rotation { qubit, .. } => qubit,
            Gate::Cnot { control, target } => control.max(target),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Rotation { axis, qubit, theta } => {
                write!(f, "R{:?}({:.4}) q{}", axis, theta, qubit)
            }
            Gate::Cnot { control, target } => write!(f, "CNOT q{} -> q{}", control, target),
        }
    }
}

/// Returns the 2x2 unitary of a rotation by `theta` about `axis`.
pub fn rotation_matrix(axis: Axis, theta: f64) -> Matrix2 {
    let half = theta / 2.0;
    let (sin, cos) = half.sin_cos();
    let zero = Complex::new(0.0, 0.0);
    match axis {
        Axis::X => [
            [Complex::new(cos, 0.0), Complex::new(0.0, -sin)],
            [Complex::new(0.0, -sin), Complex::new(cos, 0.0)],
        ],
        Axis::Y => [
            [Complex::new(cos, 0.0), Complex::new(-sin, 0.0)],
            [Complex::new(sin, 0.0), Complex::new(cos, 0.0)],
        ],
        Axis::Z => [
            [Complex::new(cos, -sin), zero],
            [zero, Complex::new(cos, sin)],
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-12;

    fn is_unitary(m: &Matrix2) -> bool {
        for row in 0..2 {
            for col in 0..2 {
                let entry: Complex<f64> = (0..2).map(|k| m[k][row].conj() * m[k][col]).sum();
                let expected = if row == col { 1.0 } else { 0.0 };
                if (entry.re - expected).abs() > TOLERANCE || entry.im.abs() > TOLERANCE {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn rotation_matrices_are_unitary_for_arbitrary_angles() {
        for &theta in &[0.0, 0.3, 1.0, PI, 2.5 * PI, -7.1] {
            for axis in [Axis::X, Axis::Y, Axis::Z] {
                assert!(is_unitary(&rotation_matrix(axis, theta)), "{:?} {}", axis, theta);
            }
        }
    }

    #[test]
    fn zero_angle_rotation_is_identity() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let m = rotation_matrix(axis, 0.0);
            assert!((m[0][0].re - 1.0).abs() < TOLERANCE);
            assert!((m[1][1].re - 1.0).abs() < TOLERANCE);
            assert!(m[0][1].norm() < TOLERANCE);
            assert!(m[1][0].norm() < TOLERANCE);
        }
    }

    #[test]
    fn max_qubit_reports_highest_index_touched() {
        assert_eq!(Gate::rx(2, 0.1).max_qubit(), 2);
        assert_eq!(Gate::cnot(3, 1).max_qubit(), 3);
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(Gate::cnot(0, 1).to_string(), "CNOT q0 -> q1");
        assert_eq!(Gate::ry(1, 0.5).to_string(), "RY(0.5000) q1");
    }
}
