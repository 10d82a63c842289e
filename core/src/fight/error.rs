//! Error types for phase graph construction

use thiserror::Error;

/// Malformed phase graph, detected before the first tick
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseGraphError {
    #[error("phase graph has no phase with ordering 0")]
    MissingStartPhase,

    #[error("ordering {ordering} is registered more than once")]
    DuplicateOrdering { ordering: u32 },

    #[error("ordering {ordering} is missing; orderings must be contiguous")]
    MissingOrdering { ordering: u32 },
}
