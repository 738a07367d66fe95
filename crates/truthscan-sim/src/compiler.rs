//! Circuit compiler
//!
//! Lowers a circuit sheet into a [`CircuitState`]:
//!
//! 1. wires are grouped into conductors; every conductor becomes one net
//! 2. each jack binds to the net of the conductor it touches; jacks touching
//!    no wire share a net with any other jack on the same point
//! 3. gates, constants and probes become functions; placed pins compile to
//!    nothing and leave their net undriven

use crate::error::Result;
use crate::evaluator::{CircuitState, Function, FunctionKind, NetId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use truthscan_netlist::{
    Circuit, ConductorId, ConductorMap, JackDirection, Point, SymbolKind,
};

/// Evaluator settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Sweeps allowed before a circuit counts as oscillating;
    /// `None` picks `2 * functions + 16`
    #[serde(default)]
    pub max_passes: Option<usize>,
}

pub fn compile(circuit: &Circuit) -> Result<CircuitState> {
    compile_with(circuit, &SimConfig::default())
}

pub fn compile_with(circuit: &Circuit, config: &SimConfig) -> Result<CircuitState> {
    let conductors = ConductorMap::new(&circuit.wires);
    let mut nets = NetAllocator::new(&conductors);
    let mut functions = Vec::new();

    for symbol in &circuit.symbols {
        let jacks = circuit.symbol_jacks(symbol);
        let kind = match &symbol.kind {
            SymbolKind::Gate { gate, width, .. } => FunctionKind::Gate {
                gate: *gate,
                width: *width,
            },
            SymbolKind::Constant { value, width } => FunctionKind::Constant {
                value: *value,
                width: *width,
            },
            SymbolKind::Probe { width } => FunctionKind::Probe { width: *width },
            SymbolKind::Pin { pin } => {
                circuit.pin(*pin)?;
                // keep the net alive so neighbouring jacks still connect
                for jack in &jacks {
                    nets.net_at(jack.point);
                }
                continue;
            }
        };

        let mut inputs = Vec::new();
        let mut output = None;
        for jack in &jacks {
            let net = nets.net_at(jack.point);
            match jack.direction {
                JackDirection::Input => inputs.push(net),
                JackDirection::Output => output = Some(net),
            }
        }
        functions.push(Function::new(symbol.id, kind, inputs, output));
    }

    let state = CircuitState::new(functions, nets.count, config.max_passes);
    debug!(
        "Compiled '{}': {} functions over {} nets ({} conductors)",
        circuit.name,
        state.function_count(),
        state.net_count(),
        conductors.conductor_count()
    );
    Ok(state)
}

struct NetAllocator<'a> {
    conductors: &'a ConductorMap,
    by_conductor: HashMap<ConductorId, NetId>,
    by_point: HashMap<Point, NetId>,
    count: usize,
}

impl<'a> NetAllocator<'a> {
    fn new(conductors: &'a ConductorMap) -> Self {
        Self {
            conductors,
            by_conductor: HashMap::new(),
            by_point: HashMap::new(),
            count: 0,
        }
    }

    fn net_at(&mut self, point: Point) -> NetId {
        let next = NetId(self.count as u32);
        let id = match self.conductors.conductor_at(point) {
            Some(c) => *self.by_conductor.entry(c.id()).or_insert(next),
            None => *self.by_point.entry(point).or_insert(next),
        };
        if id == next {
            self.count += 1;
        }
        id
    }
}
