use thiserror::Error;

/// Result type alias using [`PowerFlowError`].
pub type Result<T> = std::result::Result<T, PowerFlowError>;

/// Unified error type for network validation, solving and I/O.
#[derive(Error, Debug)]
pub enum PowerFlowError {
    /// The admittance matrix does not match the bus count.
    #[error("admittance matrix is {rows}x{cols}, expected {buses}x{buses} for {buses} buses")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        buses: usize,
    },

    /// A solvable network has exactly one slack bus.
    #[error("expected exactly one slack bus, found {0}")]
    SlackCount(usize),

    /// A branch references a bus outside the network.
    #[error("branch {index} connects bus {from} to bus {to}, outside the range 1..={buses}")]
    BranchOutOfRange {
        index: usize,
        from: usize,
        to: usize,
        buses: usize,
    },

    /// Bus type codes are 1 (slack), 0 (PQ) and 2 (PV).
    #[error("unknown bus type code {0}")]
    UnknownBusType(i64),

    /// The Newton-Raphson Jacobian could not be factorized.
    #[error("singular Jacobian in iteration {iteration}")]
    SingularJacobian { iteration: usize },

    /// A cell could not be parsed as a complex number.
    #[error("cannot parse {0:?} as a complex number")]
    InvalidComplex(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
