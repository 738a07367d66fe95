//! Error types for compilation and evaluation

use thiserror::Error;
use truthscan_netlist::NetlistError;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("Invalid circuit: {0}")]
    Netlist(#[from] NetlistError),

    #[error("Unknown function id {0}")]
    UnknownFunction(u32),

    /// A value was written to something that is not a constant source
    #[error("Function {0} is not a constant source")]
    NotAConstant(u32),
}
