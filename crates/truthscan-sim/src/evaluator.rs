//! Compiled Circuit State
//!
//! A `CircuitState` is the evaluatable form of one circuit sheet: a list of
//! functions (gates, constant sources, probes) wired to nets. It is owned
//! by exactly one caller and never shared; concurrent evaluation works by
//! compiling one state per worker.
//!
//! # Settling
//!
//! [`CircuitState::evaluate`] sweeps the functions in order, writing each
//! output straight into its net so later functions in the same sweep see it.
//! Sweeps repeat until one changes nothing. A circuit still changing after
//! `max_passes` sweeps is oscillating.

use crate::error::{Result, SimError};
use crate::gate_eval::evaluate_gate;
use crate::logic::PackedState;
use std::collections::HashMap;
use truthscan_netlist::{width_mask, GateKind, SymbolId};

/// Index of a function in a compiled circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

/// Index of a net in a compiled circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    Gate { gate: GateKind, width: u8 },
    /// Drives a settable value
    Constant { value: u32, width: u8 },
    /// Reads its net, drives nothing
    Probe { width: u8 },
}

impl FunctionKind {
    pub fn width(&self) -> u8 {
        match self {
            FunctionKind::Gate { width, .. }
            | FunctionKind::Constant { width, .. }
            | FunctionKind::Probe { width } => *width,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub symbol: SymbolId,
    pub kind: FunctionKind,
    pub inputs: Vec<NetId>,
    pub output: Option<NetId>,
    /// Last value this function drove onto its output net
    driven: PackedState,
}

impl Function {
    pub fn new(
        symbol: SymbolId,
        kind: FunctionKind,
        inputs: Vec<NetId>,
        output: Option<NetId>,
    ) -> Self {
        Self {
            symbol,
            kind,
            inputs,
            output,
            driven: PackedState::FLOATING,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Net {
    pub(crate) drivers: Vec<FunctionId>,
    pub(crate) value: PackedState,
}

/// Evaluatable circuit compiled from one sheet
#[derive(Debug, Clone)]
pub struct CircuitState {
    functions: Vec<Function>,
    nets: Vec<Net>,
    by_symbol: HashMap<SymbolId, FunctionId>,
    max_passes: usize,
}

impl CircuitState {
    pub(crate) fn new(
        functions: Vec<Function>,
        net_count: usize,
        max_passes: Option<usize>,
    ) -> Self {
        let mut nets = vec![Net::default(); net_count];
        for (i, f) in functions.iter().enumerate() {
            if let Some(out) = f.output {
                nets[out.0 as usize].drivers.push(FunctionId(i as u32));
            }
        }
        let by_symbol = functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.symbol, FunctionId(i as u32)))
            .collect();
        let max_passes = max_passes.unwrap_or(2 * functions.len() + 16);
        Self {
            functions,
            nets,
            by_symbol,
            max_passes,
        }
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    pub fn function(&self, id: FunctionId) -> Result<&Function> {
        self.functions
            .get(id.0 as usize)
            .ok_or(SimError::UnknownFunction(id.0))
    }

    /// Function compiled from `symbol`, if the symbol compiles to one
    pub fn function_for(&self, symbol: SymbolId) -> Option<FunctionId> {
        self.by_symbol.get(&symbol).copied()
    }

    /// Set the value a constant source drives
    ///
    /// Returns the value actually stored after truncation to the source's
    /// width. Takes effect on the next [`evaluate`](Self::evaluate).
    pub fn set_constant(&mut self, id: FunctionId, value: u32) -> Result<u32> {
        let function = self
            .functions
            .get_mut(id.0 as usize)
            .ok_or(SimError::UnknownFunction(id.0))?;
        match &mut function.kind {
            FunctionKind::Constant {
                value: stored,
                width,
            } => {
                *stored = value & width_mask(*width);
                Ok(*stored)
            }
            _ => Err(SimError::NotAConstant(id.0)),
        }
    }

    pub fn constant_value(&self, id: FunctionId) -> Result<u32> {
        match self.function(id)?.kind {
            FunctionKind::Constant { value, .. } => Ok(value),
            _ => Err(SimError::NotAConstant(id.0)),
        }
    }

    /// Current packed value seen by a function
    ///
    /// Probes report their net, truncated to their width; drivers report
    /// what they last drove.
    pub fn packed(&self, id: FunctionId) -> Result<PackedState> {
        let function = self.function(id)?;
        Ok(match function.kind {
            FunctionKind::Probe { width } => function
                .inputs
                .first()
                .map(|net| self.nets[net.0 as usize].value.truncate(width))
                .unwrap_or(PackedState::FLOATING),
            _ => function.driven,
        })
    }

    /// Settle the circuit; `false` means it oscillates
    pub fn evaluate(&mut self) -> bool {
        for _ in 0..self.max_passes {
            if !self.sweep() {
                return true;
            }
        }
        false
    }

    /// Drop all driven values back to floating
    pub fn reset(&mut self) {
        for f in &mut self.functions {
            f.driven = PackedState::FLOATING;
        }
        for n in &mut self.nets {
            n.value = PackedState::FLOATING;
        }
    }

    /// One in-place pass over every function; reports whether anything changed
    fn sweep(&mut self) -> bool {
        let mut changed = false;
        for index in 0..self.functions.len() {
            let Some(next) = self.compute(index) else {
                continue;
            };
            let function = &mut self.functions[index];
            if function.driven == next {
                continue;
            }
            function.driven = next;
            if let Some(net) = function.output {
                self.refresh_net(net);
            }
            changed = true;
        }
        changed
    }

    fn compute(&self, index: usize) -> Option<PackedState> {
        let function = &self.functions[index];
        match &function.kind {
            FunctionKind::Constant { value, width } => {
                Some(PackedState::from_value(*value, *width))
            }
            FunctionKind::Gate { gate, width } => {
                let inputs: Vec<PackedState> = function
                    .inputs
                    .iter()
                    .map(|net| self.nets[net.0 as usize].value)
                    .collect();
                Some(evaluate_gate(*gate, &inputs, *width))
            }
            FunctionKind::Probe { .. } => None,
        }
    }

    fn refresh_net(&mut self, net: NetId) {
        let value = self.nets[net.0 as usize]
            .drivers
            .iter()
            .map(|d| self.functions[d.0 as usize].driven)
            .fold(PackedState::FLOATING, PackedState::resolve);
        self.nets[net.0 as usize].value = value;
    }
}
