//! Error types for circuit document construction

use crate::geometry::Point;
use thiserror::Error;

/// Result type for netlist operations
pub type Result<T> = std::result::Result<T, NetlistError>;

/// Errors raised while building a circuit document
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetlistError {
    /// A wire whose two endpoints coincide
    #[error("Degenerate wire at {0}: both endpoints are the same point")]
    DegenerateWire(Point),

    /// Pin or device width outside 1..=32
    #[error("Invalid bit width {width} for '{name}' (expected 1..=32)")]
    InvalidBitWidth { name: String, width: u8 },

    /// Gate declared with an unsupported number of inputs
    #[error("Gate {gate} cannot have {inputs} inputs")]
    InvalidInputCount { gate: String, inputs: u8 },

    /// Reference to a pin that does not exist in this circuit
    #[error("Unknown pin id {0}")]
    UnknownPin(u32),

    /// Reference to a symbol that does not exist in this circuit
    #[error("Unknown symbol id {0}")]
    UnknownSymbol(u32),

    /// Symbol stored at a list position other than its id
    #[error("Symbol at index {index} has id {id}")]
    SymbolIdMismatch { index: usize, id: u32 },

    /// Two pins sharing a name
    #[error("Duplicate pin name: {0}")]
    DuplicatePinName(String),
}
