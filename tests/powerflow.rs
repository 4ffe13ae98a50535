//! End-to-end scenarios: both solvers against the same networks, plus the
//! flow post-processor on top of their solutions.

use approx::assert_abs_diff_eq;
use gridflow::prelude::*;
use gridflow::testcases;

#[test]
fn solvers_agree_on_case4() {
    let net = testcases::case4();
    let gs = gauss_seidel(&net, &GaussSeidelOptions::default()).unwrap();
    let nr = newton_raphson(&net, &NewtonOptions::default()).unwrap();
    assert!(gs.converged(1e-6), "gauss-seidel error {}", gs.error);
    assert!(nr.converged(1e-6), "newton mismatch {}", nr.error);

    for i in 0..net.n_buses() {
        assert_abs_diff_eq!(gs.v[i].norm(), nr.v[i].norm(), epsilon = 1e-4);
        assert_abs_diff_eq!(gs.v[i].arg(), nr.v[i].arg(), epsilon = 1e-3);
    }
}

#[test]
fn slack_entry_is_fixed_for_both_solvers() {
    let net = testcases::case4();
    let slack = num_complex::Complex64::new(1.02, 0.0);
    let gs = gauss_seidel(&net, &GaussSeidelOptions::default()).unwrap();
    let nr = newton_raphson(&net, &NewtonOptions::default()).unwrap();
    assert_eq!(gs.v[0], slack);
    assert_eq!(nr.v[0], slack);
}

#[test]
fn generation_covers_load_plus_losses() {
    let net = testcases::case4();
    for sol in [
        gauss_seidel(&net, &GaussSeidelOptions::default()).unwrap(),
        newton_raphson(&net, &NewtonOptions::default()).unwrap(),
    ] {
        let flows = compute_flows(&sol.v, &net).unwrap();
        let total_gen: f64 = flows.p_generated.iter().sum();
        let total_load: f64 = net.active_loads().iter().sum();
        assert_abs_diff_eq!(
            total_gen,
            total_load + flows.total_p_loss(),
            epsilon = 1e-3
        );
    }
}

#[test]
fn lossless_network_agrees_between_solvers() {
    let net = testcases::case2_lossless();
    let gs = gauss_seidel(&net, &GaussSeidelOptions::default()).unwrap();
    let nr = newton_raphson(&net, &NewtonOptions::default()).unwrap();
    assert_abs_diff_eq!(gs.v[1].re, nr.v[1].re, epsilon = 1e-6);
    assert_abs_diff_eq!(gs.v[1].im, nr.v[1].im, epsilon = 1e-6);
    assert_abs_diff_eq!(nr.v[1].im, -0.03, epsilon = 1e-6);
}

#[test]
fn best_effort_state_improves_with_more_iterations() {
    let net = testcases::case4();
    let short = gauss_seidel(
        &net,
        &GaussSeidelOptions {
            max_iterations: 2,
            ..Default::default()
        },
    )
    .unwrap();
    let long = gauss_seidel(&net, &GaussSeidelOptions::default()).unwrap();
    assert!(!short.converged(1e-6));
    assert!(long.converged(1e-6));
    assert!(short.error > long.error);
}
