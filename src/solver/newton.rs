//! Newton-Raphson power-flow solver.
//!
//! Newton iteration on the active/reactive power mismatch in polar
//! coordinates: voltage magnitude and angle are tracked as separate real
//! vectors for the whole run and recombined as `V·exp(jθ)` only at return
//! time, which keeps the linearization exact and avoids re-deriving polar
//! form from a complex value every step.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use tracing::debug;

use super::Solution;
use crate::error::{PowerFlowError, Result};
use crate::model::{BusKind, Network};

/// PQ bus voltage magnitudes are clipped to this physical band after every
/// update.
const VM_BAND: (f64, f64) = (0.9, 1.1);

/// Convergence parameters for [`newton_raphson`].
#[derive(Debug, Clone, Copy)]
pub struct NewtonOptions {
    /// Maximum absolute power mismatch accepted as converged, in per-unit.
    pub tolerance: f64,
    /// Outer iteration cap; hitting it is a normal (best-effort) return.
    pub max_iterations: usize,
    /// Update scale in (0, 1]; values below 1.0 trade speed for robustness.
    pub damping: f64,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 30,
            damping: 1.0,
        }
    }
}

/// Calculated active/reactive injections at every bus from the polar
/// power-flow equations:
///
/// `P[i] = Σ_k V[i]V[k](G[i][k]cos(θ[i]−θ[k]) + B[i][k]sin(θ[i]−θ[k]))`
/// `Q[i] = Σ_k V[i]V[k](G[i][k]sin(θ[i]−θ[k]) − B[i][k]cos(θ[i]−θ[k]))`
fn calculated_power(
    y: &DMatrix<Complex64>,
    vm: &DVector<f64>,
    theta: &DVector<f64>,
) -> (DVector<f64>, DVector<f64>) {
    let n = vm.len();
    let mut p_calc = DVector::zeros(n);
    let mut q_calc = DVector::zeros(n);
    for i in 0..n {
        for k in 0..n {
            let (g, b) = (y[(i, k)].re, y[(i, k)].im);
            let (sin, cos) = (theta[i] - theta[k]).sin_cos();
            p_calc[i] += vm[i] * vm[k] * (g * cos + b * sin);
            q_calc[i] += vm[i] * vm[k] * (g * sin - b * cos);
        }
    }
    (p_calc, q_calc)
}

/// Assembles the dense power-flow Jacobian in the fixed unknown ordering:
/// angles of `var_theta` buses first, then magnitudes of `var_vm` buses.
///
/// The four blocks use the legacy closed forms of this solver family,
/// including their diagonal terms that mix calculated active and reactive
/// injections; the iteration converges to the same mismatch-zero point
/// either way.
#[allow(clippy::too_many_arguments)]
fn build_jacobian(
    y: &DMatrix<Complex64>,
    vm: &DVector<f64>,
    theta: &DVector<f64>,
    p_calc: &DVector<f64>,
    q_calc: &DVector<f64>,
    var_theta: &[usize],
    var_vm: &[usize],
) -> DMatrix<f64> {
    let n_theta = var_theta.len();
    let n_vm = var_vm.len();
    let mut jac = DMatrix::zeros(n_theta + n_vm, n_theta + n_vm);

    // dP/dθ
    for (i, &ii) in var_theta.iter().enumerate() {
        for (j, &jj) in var_theta.iter().enumerate() {
            jac[(i, j)] = if ii == jj {
                -q_calc[ii] - vm[ii] * vm[ii] * y[(ii, ii)].im
            } else {
                let (g, b) = (y[(ii, jj)].re, y[(ii, jj)].im);
                let (sin, cos) = (theta[ii] - theta[jj]).sin_cos();
                vm[ii] * vm[jj] * (g * sin - b * cos)
            };
        }
    }
    // dP/dV
    for (i, &ii) in var_theta.iter().enumerate() {
        for (j, &jj) in var_vm.iter().enumerate() {
            jac[(i, n_theta + j)] = if ii == jj {
                p_calc[ii] / vm[ii] + vm[ii] * y[(ii, ii)].re
            } else {
                let (g, b) = (y[(ii, jj)].re, y[(ii, jj)].im);
                let (sin, cos) = (theta[ii] - theta[jj]).sin_cos();
                vm[ii] * (g * cos + b * sin)
            };
        }
    }
    // dQ/dθ
    for (i, &ii) in var_vm.iter().enumerate() {
        for (j, &jj) in var_theta.iter().enumerate() {
            jac[(n_theta + i, j)] = if ii == jj {
                p_calc[ii] - vm[ii] * vm[ii] * y[(ii, ii)].re
            } else {
                let (g, b) = (y[(ii, jj)].re, y[(ii, jj)].im);
                let (sin, cos) = (theta[ii] - theta[jj]).sin_cos();
                -vm[ii] * vm[jj] * (g * cos + b * sin)
            };
        }
    }
    // dQ/dV
    for (i, &ii) in var_vm.iter().enumerate() {
        for (j, &jj) in var_vm.iter().enumerate() {
            jac[(n_theta + i, n_theta + j)] = if ii == jj {
                q_calc[ii] / vm[ii] - vm[ii] * y[(ii, ii)].im
            } else {
                let (g, b) = (y[(ii, jj)].re, y[(ii, jj)].im);
                let (sin, cos) = (theta[ii] - theta[jj]).sin_cos();
                vm[ii] * (g * sin - b * cos)
            };
        }
    }
    jac
}

/// Solves the power flow by damped Newton-Raphson iteration.
///
/// # Arguments
///
/// * `net` - The network snapshot; validated before any numerical work.
/// * `opts` - Tolerance, iteration cap and damping factor.
///
/// # Returns
///
/// The voltage phasor vector (`V·exp(jθ)` form) with iteration diagnostics.
/// A singular Jacobian aborts the run with
/// [`PowerFlowError::SingularJacobian`]; cap exhaustion does not.
pub fn newton_raphson(net: &Network, opts: &NewtonOptions) -> Result<Solution> {
    net.validate()?;
    let n = net.n_buses();
    let y = &net.y_bus;
    let p_spec = net.active_injections();
    let q_spec = net.reactive_injections();

    let mut vm = DVector::from_iterator(n, net.buses.iter().map(|b| b.vm_pu));
    let mut theta = DVector::<f64>::zeros(n);

    // Unknown ordering: PQ angles, then PV angles, then PQ magnitudes.
    let pq: Vec<usize> = (0..n).filter(|&i| net.buses[i].kind == BusKind::Pq).collect();
    let pv: Vec<usize> = (0..n).filter(|&i| net.buses[i].kind == BusKind::Pv).collect();
    let var_theta: Vec<usize> = pq.iter().chain(pv.iter()).copied().collect();
    let var_vm = pq;
    let n_theta = var_theta.len();
    let n_vm = var_vm.len();

    let mut iterations = 0usize;
    let mut error = f64::INFINITY;

    for _ in 0..opts.max_iterations {
        let (p_calc, q_calc) = calculated_power(y, &vm, &theta);
        let mismatch = DVector::from_iterator(
            n_theta + n_vm,
            var_theta
                .iter()
                .map(|&i| p_spec[i] - p_calc[i])
                .chain(var_vm.iter().map(|&i| q_spec[i] - q_calc[i])),
        );
        error = mismatch.amax();
        iterations += 1;
        debug!(iteration = iterations, mismatch = error, "newton-raphson pass");
        if error < opts.tolerance {
            break;
        }

        let jac = build_jacobian(y, &vm, &theta, &p_calc, &q_calc, &var_theta, &var_vm);
        let dx = jac
            .lu()
            .solve(&mismatch)
            .ok_or(PowerFlowError::SingularJacobian {
                iteration: iterations,
            })?;

        for (i, &ii) in var_theta.iter().enumerate() {
            theta[ii] += opts.damping * dx[i];
        }
        for (j, &jj) in var_vm.iter().enumerate() {
            vm[jj] += opts.damping * dx[n_theta + j];
            vm[jj] = vm[jj].clamp(VM_BAND.0, VM_BAND.1);
        }
    }

    let v = DVector::from_iterator(
        n,
        (0..n).map(|i| Complex64::from_polar(vm[i], theta[i])),
    );
    Ok(Solution {
        v,
        iterations,
        error,
    })
}
