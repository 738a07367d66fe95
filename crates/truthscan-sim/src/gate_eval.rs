//! Four-valued gate evaluation
//!
//! Gates are evaluated bitwise across their width. A floating input reads
//! as 0, the way an unconnected input with a pull-down would. A conflicting
//! input is unknown: a controlling value on another input still decides the
//! output, otherwise the output bit becomes `Conflict`.

use crate::logic::{LogicState, PackedState};
use truthscan_netlist::GateKind;

/// Evaluate a gate over packed input values
///
/// `inputs` holds one packed value per gate input, in jack order. Missing
/// inputs read as floating.
pub fn evaluate_gate(gate: GateKind, inputs: &[PackedState], width: u8) -> PackedState {
    let mut out = PackedState::FLOATING;
    let mut bits: Vec<LogicState> = Vec::with_capacity(inputs.len());
    for bit in 0..width.min(32) {
        bits.clear();
        bits.extend(inputs.iter().map(|p| read_input(p.state(bit))));
        out = out.with_state(bit, evaluate_bit(gate, &bits));
    }
    out
}

fn read_input(state: LogicState) -> LogicState {
    match state {
        LogicState::Floating => LogicState::Zero,
        s => s,
    }
}

fn evaluate_bit(gate: GateKind, inputs: &[LogicState]) -> LogicState {
    let first = inputs.first().copied().unwrap_or(LogicState::Zero);
    match gate {
        GateKind::And => and(inputs),
        GateKind::Or => or(inputs),
        GateKind::Nand => not(and(inputs)),
        GateKind::Nor => not(or(inputs)),
        GateKind::Xor => xor(inputs),
        GateKind::Xnor => not(xor(inputs)),
        GateKind::Not => not(first),
        GateKind::Buffer => buffer(first),
        GateKind::TriState => {
            let enable = inputs.get(1).copied().unwrap_or(LogicState::Zero);
            match enable {
                LogicState::Zero => LogicState::Floating,
                LogicState::One => buffer(first),
                _ => LogicState::Conflict,
            }
        }
    }
}

fn and(inputs: &[LogicState]) -> LogicState {
    if inputs.contains(&LogicState::Zero) {
        LogicState::Zero
    } else if inputs.iter().all(|s| *s == LogicState::One) {
        LogicState::One
    } else {
        LogicState::Conflict
    }
}

fn or(inputs: &[LogicState]) -> LogicState {
    if inputs.contains(&LogicState::One) {
        LogicState::One
    } else if inputs.iter().all(|s| *s == LogicState::Zero) {
        LogicState::Zero
    } else {
        LogicState::Conflict
    }
}

fn xor(inputs: &[LogicState]) -> LogicState {
    let mut parity = false;
    for s in inputs {
        match s.to_bool() {
            Some(b) => parity ^= b,
            None => return LogicState::Conflict,
        }
    }
    LogicState::from_bool(parity)
}

fn not(state: LogicState) -> LogicState {
    match state {
        LogicState::Zero => LogicState::One,
        LogicState::One => LogicState::Zero,
        _ => LogicState::Conflict,
    }
}

fn buffer(state: LogicState) -> LogicState {
    if state.is_binary() {
        state
    } else {
        LogicState::Conflict
    }
}
