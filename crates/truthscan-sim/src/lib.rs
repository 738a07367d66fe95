//! Truthscan simulation - four-state logic evaluation
//!
//! This crate provides:
//! - `LogicState` and its 2-bit packed encoding (`PackedState`)
//! - Four-valued gate evaluation
//! - A compiler turning a circuit sheet into nets and functions
//! - `CircuitState`, an evaluator that settles a circuit until stable and
//!   reports oscillation when it never does

pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod gate_eval;
pub mod logic;

pub use compiler::{compile, compile_with, SimConfig};
pub use error::{Result, SimError};
pub use evaluator::{CircuitState, Function, FunctionId, FunctionKind, NetId};
pub use gate_eval::evaluate_gate;
pub use logic::{LogicState, PackedState};
