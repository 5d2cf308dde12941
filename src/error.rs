use thiserror::Error;

/// Failures reported by the optimizer and the stock-length search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CutError {
    #[error("demand length {length}mm exceeds stock length {stock_length}mm")]
    OversizedDemand { length: u32, stock_length: u32 },

    /// Greedy placement stalled with demand outstanding. Unreachable once
    /// no demand exceeds the stock length; seeing it means a logic bug.
    #[error("cannot place remaining demand into stock length {stock_length}mm")]
    InfeasibleDemand { stock_length: u32 },

    #[error("no feasible stock length between {min_length}mm and {max_length}mm")]
    NoFeasibleLength { min_length: u32, max_length: u32 },

    #[error("no demand entries given")]
    EmptyDemandSet,

    #[error("total quantity for length {length}mm exceeds {max}", max = u32::MAX)]
    QuantityOverflow { length: u32 },

    #[error("invalid search range {min_length}..={max_length} step {step}")]
    InvalidRange {
        min_length: u32,
        max_length: u32,
        step: u32,
    },
}
