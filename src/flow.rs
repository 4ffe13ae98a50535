//! Power/flow post-processor.
//!
//! Given converged voltages and the network model, derives per-bus generation
//! and per-branch flows and losses. Purely a deterministic pass over solved
//! state; no iteration, no convergence concerns.

use nalgebra::DVector;
use num_complex::Complex64;

use crate::error::Result;
use crate::model::Network;

/// Flow and loss of a single branch, measured at the origin end, in per-unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchFlow {
    /// 1-based origin bus label.
    pub from: usize,
    /// 1-based destination bus label.
    pub to: usize,
    pub p_flow: f64,
    pub q_flow: f64,
    pub p_loss: f64,
    pub q_loss: f64,
}

/// Aggregated post-solution results: per-bus generated power and per-branch
/// flows/losses, all in per-unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowReport {
    pub p_generated: DVector<f64>,
    pub q_generated: DVector<f64>,
    pub branches: Vec<BranchFlow>,
}

impl FlowReport {
    pub fn total_p_loss(&self) -> f64 {
        self.branches.iter().map(|b| b.p_loss).sum()
    }

    pub fn total_q_loss(&self) -> f64 {
        self.branches.iter().map(|b| b.q_loss).sum()
    }
}

/// Computes per-bus generation and per-branch flows/losses from a solved
/// voltage vector.
///
/// Per bus: injected current `I = Σ Y[i][k]·V[k]`, injected power
/// `S = V·conj(I)`; generation is recovered by adding the load back onto the
/// net injection. Per branch: current `I = (V[from] − V[to]) / Z`, flow at
/// the origin end from `V[from]·conj(I)`, losses `|I|²·R` and `|I|²·X`.
/// The branch model is a plain series impedance: no shunt elements, no
/// transformer taps.
pub fn compute_flows(v: &DVector<Complex64>, net: &Network) -> Result<FlowReport> {
    net.validate()?;
    let n = net.n_buses();
    let load_p = net.active_loads();
    let load_q = net.reactive_loads();

    let mut p_generated = DVector::zeros(n);
    let mut q_generated = DVector::zeros(n);
    for i in 0..n {
        let injected: Complex64 = (0..n).map(|k| net.y_bus[(i, k)] * v[k]).sum();
        let s = v[i] * injected.conj();
        p_generated[i] = s.re + load_p[i];
        q_generated[i] = -s.im + load_q[i];
    }

    let branches = net
        .branches
        .iter()
        .map(|br| {
            let current = (v[br.from - 1] - v[br.to - 1]) / br.impedance();
            let s = v[br.from - 1] * current.conj();
            let i_sq = current.norm_sqr();
            BranchFlow {
                from: br.from,
                to: br.to,
                p_flow: s.re,
                q_flow: s.im,
                p_loss: i_sq * br.resistance,
                q_loss: i_sq * br.reactance,
            }
        })
        .collect();

    Ok(FlowReport {
        p_generated,
        q_generated,
        branches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{NewtonOptions, newton_raphson};
    use crate::testcases;
    use approx::assert_abs_diff_eq;

    #[test]
    fn case4_generation_matches_reference() {
        let net = testcases::case4();
        let sol = newton_raphson(&net, &NewtonOptions::default()).unwrap();
        let report = compute_flows(&sol.v, &net).unwrap();
        // Slack picks up the losses on top of the load balance.
        assert_abs_diff_eq!(report.p_generated[0], 0.56108585, epsilon = 1e-6);
        assert_abs_diff_eq!(report.p_generated[1], 0.50, epsilon = 1e-6);
        assert_abs_diff_eq!(report.p_generated[2], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(report.p_generated[3], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn case4_active_power_balances() {
        let net = testcases::case4();
        let sol = newton_raphson(&net, &NewtonOptions::default()).unwrap();
        let report = compute_flows(&sol.v, &net).unwrap();
        let total_gen: f64 = report.p_generated.iter().sum();
        let total_load: f64 = net.active_loads().iter().sum();
        assert_abs_diff_eq!(total_gen, total_load + report.total_p_loss(), epsilon = 1e-9);
    }

    #[test]
    fn case4_branch_flows_match_reference() {
        let net = testcases::case4();
        let sol = newton_raphson(&net, &NewtonOptions::default()).unwrap();
        let report = compute_flows(&sol.v, &net).unwrap();
        let expected = [
            (0.15780294, 0.11780817, 0.00074549, 0.00223648),
            (0.40328291, 0.17387163, 0.00370758, 0.01112275),
            (0.14063917, 0.01067122, 0.00097506, 0.00195013),
            (0.31641827, 0.04018104, 0.00498652, 0.00997305),
            (0.08923944, 0.02146997, 0.00067119, 0.00167797),
        ];
        for (flow, (p, q, pl, ql)) in report.branches.iter().zip(expected) {
            assert_abs_diff_eq!(flow.p_flow, p, epsilon = 1e-5);
            assert_abs_diff_eq!(flow.q_flow, q, epsilon = 1e-5);
            assert_abs_diff_eq!(flow.p_loss, pl, epsilon = 1e-5);
            assert_abs_diff_eq!(flow.q_loss, ql, epsilon = 1e-5);
        }
    }

    #[test]
    fn lossless_branch_conserves_active_power() {
        let net = testcases::case2_lossless();
        let sol = newton_raphson(&net, &NewtonOptions::default()).unwrap();
        let report = compute_flows(&sol.v, &net).unwrap();
        let flow = &report.branches[0];
        // Zero resistance: what leaves bus 1 arrives at bus 2 untouched.
        assert_abs_diff_eq!(flow.p_loss, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(flow.p_flow, 0.30, epsilon = 1e-6);
        // The reactive branch still burns vars.
        assert_abs_diff_eq!(flow.q_loss, 0.01021473, epsilon = 1e-6);
    }
}
