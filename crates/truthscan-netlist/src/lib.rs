//! Truthscan netlist - circuit documents and wire connectivity
//!
//! This crate handles:
//! - The circuit document model (pins, placed symbols, wires)
//! - Jack geometry for every symbol on a sheet
//! - Partitioning of wires into electrically connected conductors

pub mod circuit;
pub mod conductor;
pub mod error;
pub mod geometry;

pub use circuit::{
    width_mask, Circuit, GateKind, Jack, JackDirection, Pin, PinId, PinSide, PinType, Symbol,
    SymbolId, SymbolKind, GATE_SPAN, MAX_BIT_WIDTH,
};
pub use conductor::{Conductor, ConductorId, ConductorMap};
pub use error::{NetlistError, Result};
pub use geometry::{Point, Wire, WireId};
