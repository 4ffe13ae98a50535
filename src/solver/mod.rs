//! Iterative power-flow solvers.
//!
//! Two independent implementations of the same contract: take a validated
//! [`Network`](crate::model::Network) plus convergence parameters, return the
//! solved voltage phasor vector with iteration diagnostics. Neither solver
//! treats cap exhaustion as an error; the caller judges the final `error`
//! against its own tolerance.

pub mod gauss_seidel;
pub mod newton;

use nalgebra::DVector;
use num_complex::Complex64;

pub use gauss_seidel::{Acceleration, GaussSeidelOptions, gauss_seidel};
pub use newton::{NewtonOptions, newton_raphson};

/// Output of a solver run: the voltage phasor vector (one entry per bus, in
/// admittance-matrix order), the number of outer iterations performed and the
/// final error or mismatch magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub v: DVector<Complex64>,
    pub iterations: usize,
    pub error: f64,
}

impl Solution {
    /// Whether the final error meets the given tolerance.
    pub fn converged(&self, tolerance: f64) -> bool {
        self.error <= tolerance
    }
}
