//! Pin Sockets
//!
//! A socketed circuit is a private copy of a circuit in which every placed
//! input pin is replaced by a constant source and every placed output pin by
//! a probe. The copy is compiled, and each pin is paired with the function
//! handle that drives or reads it.
//!
//! Pins that cannot be resolved to a function, for example pins never
//! placed on the sheet, are left out of both socket lists.

use crate::error::{Result, TestError};
use tracing::warn;
use truthscan_netlist::{Circuit, Pin, PinId, SymbolId, SymbolKind};
use truthscan_sim::{compile_with, CircuitState, FunctionId, PackedState, SimConfig};

/// An input pin driven through an injected constant source
#[derive(Debug, Clone)]
pub struct InputPinSocket {
    pin_id: PinId,
    pin: Pin,
    symbol: SymbolId,
    function: FunctionId,
}

impl InputPinSocket {
    pub fn pin_id(&self) -> PinId {
        self.pin_id
    }

    pub fn pin(&self) -> &Pin {
        &self.pin
    }

    pub fn name(&self) -> &str {
        &self.pin.name
    }

    pub fn bit_width(&self) -> u8 {
        self.pin.bit_width
    }

    /// Symbol of the injected source on the copy
    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }
}

/// An output pin observed through an injected probe
#[derive(Debug, Clone)]
pub struct OutputPinSocket {
    pin_id: PinId,
    pin: Pin,
    symbol: SymbolId,
    function: FunctionId,
}

impl OutputPinSocket {
    pub fn pin_id(&self) -> PinId {
        self.pin_id
    }

    pub fn pin(&self) -> &Pin {
        &self.pin
    }

    pub fn name(&self) -> &str {
        &self.pin.name
    }

    pub fn bit_width(&self) -> u8 {
        self.pin.bit_width
    }

    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }
}

/// A compiled private copy of a circuit with its pin sockets
#[derive(Debug, Clone)]
pub struct SocketedCircuit {
    circuit: Circuit,
    state: CircuitState,
    inputs: Vec<InputPinSocket>,
    outputs: Vec<OutputPinSocket>,
}

impl SocketedCircuit {
    /// Copy `circuit`, inject sources and probes, compile the copy
    pub fn new(circuit: &Circuit, config: &SimConfig) -> Result<Self> {
        circuit.validate()?;
        let mut copy = circuit.clone();
        copy.prune_degenerate_wires();

        let mut injected_inputs = Vec::new();
        for (pin_id, pin) in circuit.input_pins() {
            let Some(symbol) = copy.pin_symbol(pin_id) else {
                warn!("Input pin '{}' is not placed on the sheet; skipping", pin.name);
                continue;
            };
            copy.replace_symbol_kind(
                symbol,
                SymbolKind::Constant {
                    value: 0,
                    width: pin.bit_width,
                },
            )?;
            injected_inputs.push((pin_id, pin.clone(), symbol));
        }

        let mut injected_outputs = Vec::new();
        for (pin_id, pin) in circuit.output_pins() {
            let Some(symbol) = copy.pin_symbol(pin_id) else {
                warn!("Output pin '{}' is not placed on the sheet; skipping", pin.name);
                continue;
            };
            copy.replace_symbol_kind(
                symbol,
                SymbolKind::Probe {
                    width: pin.bit_width,
                },
            )?;
            injected_outputs.push((pin_id, pin.clone(), symbol));
        }

        let state = compile_with(&copy, config)?;

        let inputs = injected_inputs
            .into_iter()
            .filter_map(|(pin_id, pin, symbol)| {
                let function = state.function_for(symbol)?;
                Some(InputPinSocket {
                    pin_id,
                    pin,
                    symbol,
                    function,
                })
            })
            .collect();
        let outputs = injected_outputs
            .into_iter()
            .filter_map(|(pin_id, pin, symbol)| {
                let function = state.function_for(symbol)?;
                Some(OutputPinSocket {
                    pin_id,
                    pin,
                    symbol,
                    function,
                })
            })
            .collect();

        Ok(Self {
            circuit: copy,
            state,
            inputs,
            outputs,
        })
    }

    /// The rewritten copy
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn state(&self) -> &CircuitState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CircuitState {
        &mut self.state
    }

    pub fn inputs(&self) -> &[InputPinSocket] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPinSocket] {
        &self.outputs
    }

    pub fn input_widths(&self) -> Vec<u8> {
        self.inputs.iter().map(|s| s.bit_width()).collect()
    }

    pub fn output_widths(&self) -> Vec<u8> {
        self.outputs.iter().map(|s| s.bit_width()).collect()
    }

    /// Drive one input; returns the value the source actually holds
    pub fn drive(&mut self, index: usize, value: u32) -> Result<u32> {
        let socket = self
            .inputs
            .get(index)
            .ok_or(TestError::InputIndex(index))?;
        Ok(self.state.set_constant(socket.function, value)?)
    }

    /// Packed value currently seen by one output
    pub fn observe(&self, index: usize) -> Result<PackedState> {
        let socket = self
            .outputs
            .get(index)
            .ok_or(TestError::OutputIndex(index))?;
        Ok(self.state.packed(socket.function)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use truthscan_netlist::{GateKind, NetlistError, GATE_SPAN};

    fn buffer_circuit() -> Circuit {
        let mut c = Circuit::new("buf");
        let a = c.add_pin(Pin::input("a", 4).unwrap()).unwrap();
        let y = c.add_pin(Pin::output("y", 4).unwrap()).unwrap();
        // declared but never placed
        c.add_pin(Pin::input("ghost", 2).unwrap()).unwrap();
        c.place_pin(a, (-2, 0)).unwrap();
        c.add_gate(GateKind::Buffer, 1, 4, (0, 0)).unwrap();
        c.place_pin(y, (6, 0)).unwrap();
        c.add_wire((-2, 0), (0, 0)).unwrap();
        c.add_wire((GATE_SPAN, 0), (6, 0)).unwrap();
        c
    }

    #[test]
    fn test_original_is_untouched() {
        let original = buffer_circuit();
        let snapshot = original.clone();
        let socketed = SocketedCircuit::new(&original, &SimConfig::default()).unwrap();
        assert_eq!(original, snapshot);
        assert_ne!(socketed.circuit(), &original);
    }

    #[test]
    fn test_unplaced_pins_are_dropped() {
        let socketed = SocketedCircuit::new(&buffer_circuit(), &SimConfig::default()).unwrap();
        let names: Vec<_> = socketed.inputs().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(socketed.outputs().len(), 1);
        assert_eq!(socketed.input_widths(), vec![4]);
    }

    #[test]
    fn test_drive_and_observe() {
        let mut socketed =
            SocketedCircuit::new(&buffer_circuit(), &SimConfig::default()).unwrap();
        assert_eq!(socketed.drive(0, 9).unwrap(), 9);
        assert!(socketed.state_mut().evaluate());
        assert_eq!(socketed.observe(0).unwrap().decode(4), Some(9));
        assert!(socketed.drive(3, 1).is_err());
        assert!(socketed.observe(1).is_err());
    }

    #[test]
    fn test_misnumbered_symbols_are_rejected() {
        let mut c = Circuit::new("inverter");
        let a = c.add_pin(Pin::input("a", 1).unwrap()).unwrap();
        let y = c.add_pin(Pin::output("y", 1).unwrap()).unwrap();
        c.add_gate(GateKind::Not, 1, 1, (0, 0)).unwrap();
        c.place_pin(a, (0, 0)).unwrap();
        c.place_pin(y, (GATE_SPAN, 0)).unwrap();
        c.symbols.reverse();

        assert!(matches!(
            SocketedCircuit::new(&c, &SimConfig::default()),
            Err(TestError::Netlist(NetlistError::SymbolIdMismatch { index: 0, id: 2 }))
        ));
    }
}
