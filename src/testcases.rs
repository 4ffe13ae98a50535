//! Embedded benchmark networks for tests, examples and quick CLI runs.

use crate::io::network_from_json_str;
use crate::model::{Branch, Bus, BusKind, DEFAULT_S_BASE_MVA, Network};

/// 4-bus benchmark: one slack, one PV, two PQ buses under moderate loading,
/// five series branches. The admittance matrix is assembled from the branch
/// impedances, so branch flows and bus injections are mutually consistent.
pub const CASE4: &str = r#"{
  "sn_mva": 100.0,
  "bus": [
    { "bus": 1, "type": 1, "vm_pu": 1.02, "gen_mw": 0.0,  "gen_mvar": 0.0, "load_mw": 0.0,  "load_mvar": 0.0 },
    { "bus": 2, "type": 2, "vm_pu": 1.01, "gen_mw": 50.0, "gen_mvar": 0.0, "load_mw": 20.0, "load_mvar": 10.0 },
    { "bus": 3, "type": 0, "vm_pu": 1.0,  "gen_mw": 0.0,  "gen_mvar": 0.0, "load_mw": 45.0, "load_mvar": 15.0 },
    { "bus": 4, "type": 0, "vm_pu": 1.0,  "gen_mw": 0.0,  "gen_mvar": 0.0, "load_mw": 40.0, "load_mvar": 5.0 }
  ],
  "branch": [
    { "from": 1, "to": 2, "resistance": 0.02, "reactance": 0.06 },
    { "from": 1, "to": 3, "resistance": 0.02, "reactance": 0.06 },
    { "from": 2, "to": 3, "resistance": 0.05, "reactance": 0.10 },
    { "from": 2, "to": 4, "resistance": 0.05, "reactance": 0.10 },
    { "from": 3, "to": 4, "resistance": 0.08, "reactance": 0.20 }
  ]
}"#;

/// 2-bus network with a purely reactive branch and an explicit admittance
/// matrix in the file.
pub const CASE2_LOSSLESS: &str = r#"{
  "sn_mva": 100.0,
  "bus": [
    { "bus": 1, "type": 1, "vm_pu": 1.0, "gen_mw": 0.0, "gen_mvar": 0.0, "load_mw": 0.0,  "load_mvar": 0.0 },
    { "bus": 2, "type": 0, "vm_pu": 1.0, "gen_mw": 0.0, "gen_mvar": 0.0, "load_mw": 30.0, "load_mvar": 10.0 }
  ],
  "branch": [
    { "from": 1, "to": 2, "resistance": 0.0, "reactance": 0.1 }
  ],
  "y_bus": [
    ["-10i", "10i"],
    ["10i", "-10i"]
  ]
}"#;

pub fn case4() -> Network {
    network_from_json_str(CASE4).unwrap()
}

pub fn case2_lossless() -> Network {
    network_from_json_str(CASE2_LOSSLESS).unwrap()
}

/// 3-bus fixture whose third bus has no connections at all: its
/// self-admittance is exactly zero. Gauss-Seidel recovers locally by holding
/// the bus voltage; Newton-Raphson hits a singular Jacobian.
pub fn isolated_bus_fixture() -> Network {
    let bus = |index, kind, load_mw, load_mvar| Bus {
        index,
        kind,
        vm_pu: 1.0,
        gen_mw: 0.0,
        gen_mvar: 0.0,
        load_mw,
        load_mvar,
    };
    Network::from_branches(
        DEFAULT_S_BASE_MVA,
        vec![
            bus(1, BusKind::Slack, 0.0, 0.0),
            bus(2, BusKind::Pq, 30.0, 10.0),
            bus(3, BusKind::Pq, 0.0, 0.0),
        ],
        vec![Branch {
            from: 1,
            to: 2,
            resistance: 0.0,
            reactance: 0.1,
        }],
    )
    .unwrap()
}
