//! Error types for truth-table construction

use crate::filter::FilterError;
use thiserror::Error;
use truthscan_netlist::NetlistError;
use truthscan_sim::SimError;

pub type Result<T> = std::result::Result<T, TestError>;

/// Failures of the test harness
///
/// Oscillation and truncation are outcomes, not errors; they are reported
/// through [`crate::TruthTable`].
#[derive(Debug, Error)]
pub enum TestError {
    /// The circuit lacks an input pin or an output pin
    #[error("Circuit '{0}' is not testable: it needs at least one input and one output pin")]
    NotTestable(String),

    #[error(transparent)]
    Netlist(#[from] NetlistError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("Invalid row filter: {0}")]
    Filter(#[from] FilterError),

    /// Broken internal assumption, e.g. a driven value silently truncated
    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    #[error("No input pin socket at index {0}")]
    InputIndex(usize),

    #[error("No output pin socket at index {0}")]
    OutputIndex(usize),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}
