pub mod error;
pub mod flow;
pub mod io;
pub mod model;
pub mod report;
pub mod solver;
pub mod testcases;

pub mod prelude {
    pub use crate::error::{PowerFlowError, Result};
    pub use crate::flow::{BranchFlow, FlowReport, compute_flows};
    pub use crate::model::{Branch, Bus, BusKind, Network};
    pub use crate::solver::{
        Acceleration, GaussSeidelOptions, NewtonOptions, Solution, gauss_seidel, newton_raphson,
    };
}
