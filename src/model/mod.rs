//! In-memory network model consumed by both solvers and the post-processor.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{PowerFlowError, Result};

/// System power base in MVA; MW/MVAr columns are divided by this to get per-unit.
pub const DEFAULT_S_BASE_MVA: f64 = 100.0;

/// Operating role of a bus.
///
/// The wire encoding follows the bus table convention: 1 = slack, 0 = PQ, 2 = PV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusKind {
    /// Reference bus, fixed magnitude and zero angle.
    Slack,
    /// Fixed active/reactive injection, floating magnitude and angle.
    Pq,
    /// Fixed active injection and magnitude, floating angle and reactive power.
    Pv,
}

impl BusKind {
    /// Decodes the integer tag used by bus tables.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(BusKind::Slack),
            0 => Ok(BusKind::Pq),
            2 => Ok(BusKind::Pv),
            other => Err(PowerFlowError::UnknownBusType(other)),
        }
    }

    /// Integer tag for serialization back to tables.
    pub fn code(&self) -> i64 {
        match self {
            BusKind::Slack => 1,
            BusKind::Pq => 0,
            BusKind::Pv => 2,
        }
    }
}

/// Represents a bus in the network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bus {
    /// 1-based stable bus label, matching the admittance matrix order.
    pub index: usize,
    pub kind: BusKind,
    /// Specified voltage magnitude in per-unit. Initial value for PQ buses,
    /// fixed magnitude for slack and PV buses.
    pub vm_pu: f64,
    pub gen_mw: f64,
    pub gen_mvar: f64,
    pub load_mw: f64,
    pub load_mvar: f64,
}

/// Represents a series-impedance branch between two buses.
///
/// Used only by the flow post-processor; the solvers see the network through
/// the admittance matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Branch {
    /// 1-based origin bus label.
    pub from: usize,
    /// 1-based destination bus label.
    pub to: usize,
    pub resistance: f64,
    pub reactance: f64,
}

impl Branch {
    /// Series impedance `R + jX`.
    pub fn impedance(&self) -> Complex64 {
        Complex64::new(self.resistance, self.reactance)
    }
}

/// Represents a power-flow network snapshot: admittance matrix, bus table and
/// branch table. Read-only once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    /// System power base in MVA.
    pub s_base_mva: f64,
    /// Dense nodal admittance matrix, one row/column per bus.
    pub y_bus: DMatrix<Complex64>,
    pub buses: Vec<Bus>,
    pub branches: Vec<Branch>,
}

impl Network {
    /// Builds a network from branch impedances, assembling the admittance
    /// matrix from the series admittance of every branch.
    pub fn from_branches(s_base_mva: f64, buses: Vec<Bus>, branches: Vec<Branch>) -> Result<Self> {
        let n = buses.len();
        let mut y_bus = DMatrix::<Complex64>::zeros(n, n);
        for (idx, br) in branches.iter().enumerate() {
            if br.from < 1 || br.from > n || br.to < 1 || br.to > n {
                return Err(PowerFlowError::BranchOutOfRange {
                    index: idx + 1,
                    from: br.from,
                    to: br.to,
                    buses: n,
                });
            }
            let y = Complex64::new(1.0, 0.0) / br.impedance();
            let (f, t) = (br.from - 1, br.to - 1);
            y_bus[(f, f)] += y;
            y_bus[(t, t)] += y;
            y_bus[(f, t)] -= y;
            y_bus[(t, f)] -= y;
        }
        let net = Network {
            s_base_mva,
            y_bus,
            buses,
            branches,
        };
        net.validate()?;
        Ok(net)
    }

    pub fn n_buses(&self) -> usize {
        self.buses.len()
    }

    /// Checks the structural preconditions shared by both solvers and the
    /// post-processor. Called at every public entry point before any
    /// numerical work starts.
    pub fn validate(&self) -> Result<()> {
        let n = self.buses.len();
        if self.y_bus.nrows() != n || self.y_bus.ncols() != n {
            return Err(PowerFlowError::ShapeMismatch {
                rows: self.y_bus.nrows(),
                cols: self.y_bus.ncols(),
                buses: n,
            });
        }
        let slacks = self
            .buses
            .iter()
            .filter(|b| b.kind == BusKind::Slack)
            .count();
        if slacks != 1 {
            return Err(PowerFlowError::SlackCount(slacks));
        }
        for (idx, br) in self.branches.iter().enumerate() {
            if br.from < 1 || br.from > n || br.to < 1 || br.to > n {
                return Err(PowerFlowError::BranchOutOfRange {
                    index: idx + 1,
                    from: br.from,
                    to: br.to,
                    buses: n,
                });
            }
        }
        Ok(())
    }

    /// Net specified active injection per bus, in per-unit.
    pub fn active_injections(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.buses.len(),
            self.buses
                .iter()
                .map(|b| (b.gen_mw - b.load_mw) / self.s_base_mva),
        )
    }

    /// Net specified reactive injection per bus, in per-unit.
    pub fn reactive_injections(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.buses.len(),
            self.buses
                .iter()
                .map(|b| (b.gen_mvar - b.load_mvar) / self.s_base_mva),
        )
    }

    /// Active load per bus, in per-unit.
    pub fn active_loads(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.buses.len(),
            self.buses.iter().map(|b| b.load_mw / self.s_base_mva),
        )
    }

    /// Reactive load per bus, in per-unit.
    pub fn reactive_loads(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.buses.len(),
            self.buses.iter().map(|b| b.load_mvar / self.s_base_mva),
        )
    }

    /// Initial voltage vector: specified magnitudes at zero angle.
    pub fn v_init(&self) -> DVector<Complex64> {
        DVector::from_iterator(
            self.buses.len(),
            self.buses.iter().map(|b| Complex64::new(b.vm_pu, 0.0)),
        )
    }
}
