//! Gauss-Seidel power-flow solver.
//!
//! Fixed-point sweep over the non-slack buses, updating the voltage vector in
//! place so every bus sees the values already computed in the current pass.

use num_complex::Complex64;
use num_traits::Zero;
use tracing::debug;

use super::Solution;
use crate::error::Result;
use crate::model::{BusKind, Network};

/// Per-bus-kind relaxation factors applied as a multiplicative scale on the
/// whole voltage update. Fixed tuning constants, not derived state; values
/// other than 1.0 bias the fixed point and should be used with care.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub pq: f64,
    pub pv: f64,
}

impl Default for Acceleration {
    fn default() -> Self {
        Self { pq: 1.0, pv: 1.0 }
    }
}

impl Acceleration {
    fn factor(&self, kind: BusKind) -> f64 {
        match kind {
            BusKind::Pq => self.pq,
            BusKind::Pv => self.pv,
            BusKind::Slack => 1.0,
        }
    }
}

/// Convergence parameters for [`gauss_seidel`].
#[derive(Debug, Clone, Copy)]
pub struct GaussSeidelOptions {
    /// Maximum voltage update magnitude accepted as converged.
    pub tolerance: f64,
    /// Outer iteration cap; hitting it is a normal (best-effort) return.
    pub max_iterations: usize,
    pub acceleration: Acceleration,
}

impl Default for GaussSeidelOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 1000,
            acceleration: Acceleration::default(),
        }
    }
}

/// Solves the power flow by Gauss-Seidel iteration.
///
/// # Arguments
///
/// * `net` - The network snapshot; validated before any numerical work.
/// * `opts` - Tolerance, iteration cap and acceleration table.
///
/// # Returns
///
/// The voltage phasor vector together with the iterations performed and the
/// final error (maximum voltage update magnitude over the non-slack buses in
/// the last sweep). Never fails for non-convergence.
pub fn gauss_seidel(net: &Network, opts: &GaussSeidelOptions) -> Result<Solution> {
    net.validate()?;
    let n = net.n_buses();
    let y = &net.y_bus;
    let p = net.active_injections();
    let mut q = net.reactive_injections();
    // Slack and PV reactive targets come from the voltage state, not the
    // bus table; pin them to zero before the first sweep.
    for (k, bus) in net.buses.iter().enumerate() {
        if bus.kind != BusKind::Pq {
            q[k] = 0.0;
        }
    }

    let mut v = net.v_init();
    let mut iterations = 0usize;
    let mut error = f64::INFINITY;

    while error > opts.tolerance && iterations < opts.max_iterations {
        let v_prev = v.clone_owned();
        iterations += 1;
        error = 0.0;

        for (k, bus) in net.buses.iter().enumerate() {
            if bus.kind == BusKind::Slack {
                continue;
            }
            let yv: Complex64 = (0..n).filter(|&m| m != k).map(|m| y[(k, m)] * v[m]).sum();
            let y_kk = y[(k, k)];
            if y_kk.is_zero() {
                // Local recovery: hold the bus at its previous value and
                // continue the sweep.
                v[k] = v_prev[k];
            } else {
                let accel = opts.acceleration.factor(bus.kind);
                match bus.kind {
                    BusKind::Pq => {
                        let s = Complex64::new(p[k], -q[k]);
                        v[k] = (s / v[k].conj() - yv) * accel / y_kk;
                    }
                    BusKind::Pv => {
                        // Reactive injection implied by the current state.
                        let q_calc = -(v[k].conj() * (yv + y_kk * v[k])).im;
                        let s = Complex64::new(p[k], -q_calc);
                        v[k] = (s / v[k].conj() - yv) * accel / y_kk;
                        // Re-normalize to the regulated magnitude, keeping
                        // the newly computed angle.
                        v[k] = v[k] / v[k].norm() * v_prev[k].norm();
                    }
                    BusKind::Slack => unreachable!(),
                }
            }
            error = error.max((v[k] - v_prev[k]).norm());
        }
        debug!(iteration = iterations, error, "gauss-seidel sweep");
    }

    Ok(Solution {
        v,
        iterations,
        error,
    })
}
