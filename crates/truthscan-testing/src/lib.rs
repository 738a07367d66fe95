//! Truthscan testing - exhaustive truth-table construction
//!
//! This crate provides:
//! - Pin sockets: a circuit copy whose input pins are replaced by constant
//!   sources and whose output pins are replaced by probes
//! - `TableChunk`: enumeration of one contiguous slice of the input space
//! - `CircuitTestSocket`: splitting the input space across workers and
//!   merging the chunk results
//! - A small expression language for filtering truth-table rows

pub mod chunk;
pub mod combination;
pub mod config;
pub mod error;
pub mod filter;
pub mod pin_socket;
pub mod socket;
pub mod truth_state;

pub use chunk::{ChunkContext, TableChunk};
pub use combination::{
    input_bit_count, join_combination, partition_range, split_combination, total_combinations,
    ChunkRange,
};
pub use config::SocketConfig;
pub use error::{Result, TestError};
pub use filter::{FilterError, PinNames, RowFilter};
pub use pin_socket::{InputPinSocket, OutputPinSocket, SocketedCircuit};
pub use socket::{CircuitTestSocket, TruthTable};
pub use truth_state::TruthState;
