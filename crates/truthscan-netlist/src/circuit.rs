//! Circuit Document Model
//!
//! A [`Circuit`] is one drawing sheet: the list of logical pins the circuit
//! exposes, the symbols placed on the sheet, and the wires joining them.
//!
//! # Geometry
//!
//! Every symbol exposes *jacks*, the lattice points where wires attach:
//!
//! ```text
//!   gate at (x, y), n inputs           pin / constant / probe at (x, y)
//!
//!   (x, y)     ──┐                      (x, y) ●
//!   (x, y + 1) ──┤ GATE ├── (x + GATE_SPAN, y)
//!   ...          │
//!   (x, y + n-1)─┘
//! ```
//!
//! A circuit is plain data: cloning it yields a fully independent copy that
//! can be rewritten and compiled without touching the original.

use crate::error::{NetlistError, Result};
use crate::geometry::{Point, Wire, WireId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal distance between a gate's input column and its output jack
pub const GATE_SPAN: i32 = 3;

/// Widest signal a single pin or device can carry
pub const MAX_BIT_WIDTH: u8 = 32;

/// Index of a pin within its circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub u32);

/// Index of a symbol within its circuit sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinType {
    Input,
    Output,
    #[default]
    None,
}

/// Side of the circuit's outline a pin is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinSide {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
}

/// A named external connection of a circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    /// Number of bits carried, 1..=32
    pub bit_width: u8,
    pub pin_type: PinType,
    #[serde(default)]
    pub side: PinSide,
    #[serde(default)]
    pub inverted: bool,
}

impl Pin {
    pub fn new(name: impl Into<String>, bit_width: u8, pin_type: PinType) -> Result<Self> {
        let name = name.into();
        check_width(&name, bit_width)?;
        let side = match pin_type {
            PinType::Output => PinSide::Right,
            _ => PinSide::Left,
        };
        Ok(Self {
            name,
            bit_width,
            pin_type,
            side,
            inverted: false,
        })
    }

    pub fn input(name: impl Into<String>, bit_width: u8) -> Result<Self> {
        Self::new(name, bit_width, PinType::Input)
    }

    pub fn output(name: impl Into<String>, bit_width: u8) -> Result<Self> {
        Self::new(name, bit_width, PinType::Output)
    }

    /// Largest unsigned value this pin can carry
    pub fn max_value(&self) -> u32 {
        width_mask(self.bit_width)
    }
}

/// Logic gate families understood by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
    Not,
    Buffer,
    /// inputs: [data, enable]; output floats while enable is low
    TriState,
}

impl GateKind {
    /// Allowed input counts for this gate family
    pub fn input_range(&self) -> std::ops::RangeInclusive<u8> {
        match self {
            GateKind::Not | GateKind::Buffer => 1..=1,
            GateKind::TriState => 2..=2,
            _ => 2..=16,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
            GateKind::Not => "NOT",
            GateKind::Buffer => "BUF",
            GateKind::TriState => "TRIBUF",
        };
        f.write_str(name)
    }
}

/// What a placed symbol is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SymbolKind {
    /// Bitwise gate of the given width
    Gate { gate: GateKind, inputs: u8, width: u8 },
    /// Placement of one of the circuit's own pins on the sheet
    Pin { pin: PinId },
    /// Constant source driving `value` onto its jack
    Constant { value: u32, width: u8 },
    /// Probe observing the net its jack touches
    Probe { width: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub position: Point,
    pub kind: SymbolKind,
}

/// Whether a jack drives its net or only reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JackDirection {
    Input,
    Output,
}

/// A connection point of a placed symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Jack {
    pub symbol: SymbolId,
    /// Position of the jack in the symbol's jack list
    pub index: usize,
    pub point: Point,
    pub direction: JackDirection,
    pub width: u8,
}

/// One circuit sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    pub name: String,
    #[serde(default)]
    pub pins: Vec<Pin>,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub wires: Vec<Wire>,
}

impl Circuit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declare a pin on the circuit's interface
    pub fn add_pin(&mut self, pin: Pin) -> Result<PinId> {
        if self.pins.iter().any(|p| p.name == pin.name) {
            return Err(NetlistError::DuplicatePinName(pin.name));
        }
        check_width(&pin.name, pin.bit_width)?;
        self.pins.push(pin);
        Ok(PinId(self.pins.len() as u32 - 1))
    }

    /// Place a declared pin on the sheet
    pub fn place_pin(&mut self, pin: PinId, position: impl Into<Point>) -> Result<SymbolId> {
        self.pin(pin)?;
        Ok(self.push_symbol(position.into(), SymbolKind::Pin { pin }))
    }

    pub fn add_gate(
        &mut self,
        gate: GateKind,
        inputs: u8,
        width: u8,
        position: impl Into<Point>,
    ) -> Result<SymbolId> {
        check_gate(gate, inputs, width)?;
        Ok(self.push_symbol(
            position.into(),
            SymbolKind::Gate {
                gate,
                inputs,
                width,
            },
        ))
    }

    pub fn add_constant(
        &mut self,
        value: u32,
        width: u8,
        position: impl Into<Point>,
    ) -> Result<SymbolId> {
        check_width("constant", width)?;
        let value = value & width_mask(width);
        Ok(self.push_symbol(position.into(), SymbolKind::Constant { value, width }))
    }

    pub fn add_probe(&mut self, width: u8, position: impl Into<Point>) -> Result<SymbolId> {
        check_width("probe", width)?;
        Ok(self.push_symbol(position.into(), SymbolKind::Probe { width }))
    }

    pub fn add_wire(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> Result<WireId> {
        let wire = Wire::new(p1, p2);
        if wire.is_degenerate() {
            return Err(NetlistError::DegenerateWire(wire.p1));
        }
        self.wires.push(wire);
        Ok(WireId(self.wires.len() as u32 - 1))
    }

    /// Drop degenerate wires that slipped in through deserialization
    pub fn prune_degenerate_wires(&mut self) -> usize {
        let before = self.wires.len();
        self.wires.retain(|w| !w.is_degenerate());
        before - self.wires.len()
    }

    pub fn pin(&self, id: PinId) -> Result<&Pin> {
        self.pins
            .get(id.0 as usize)
            .ok_or(NetlistError::UnknownPin(id.0))
    }

    pub fn symbol(&self, id: SymbolId) -> Result<&Symbol> {
        self.symbols
            .get(id.0 as usize)
            .ok_or(NetlistError::UnknownSymbol(id.0))
    }

    /// Input-typed pins in declaration order
    pub fn input_pins(&self) -> impl Iterator<Item = (PinId, &Pin)> + '_ {
        self.pins_of_type(PinType::Input)
    }

    /// Output-typed pins in declaration order
    pub fn output_pins(&self) -> impl Iterator<Item = (PinId, &Pin)> + '_ {
        self.pins_of_type(PinType::Output)
    }

    fn pins_of_type(&self, pin_type: PinType) -> impl Iterator<Item = (PinId, &Pin)> + '_ {
        self.pins
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.pin_type == pin_type)
            .map(|(i, p)| (PinId(i as u32), p))
    }

    /// First symbol placing `pin` on the sheet, if any
    pub fn pin_symbol(&self, pin: PinId) -> Option<SymbolId> {
        self.symbols
            .iter()
            .find(|s| matches!(s.kind, SymbolKind::Pin { pin: p } if p == pin))
            .map(|s| s.id)
    }

    /// Swap what a symbol is while keeping its id and position
    pub fn replace_symbol_kind(&mut self, id: SymbolId, kind: SymbolKind) -> Result<()> {
        let symbol = self
            .symbols
            .get_mut(id.0 as usize)
            .ok_or(NetlistError::UnknownSymbol(id.0))?;
        symbol.kind = kind;
        Ok(())
    }

    /// Check a loaded document against the rules the builders enforce
    ///
    /// Symbols must sit at the index matching their id, pins must be uniquely
    /// named with widths in 1..=32, gates must have a legal input count, and
    /// every placed pin must exist. Degenerate wires are left to
    /// [`Circuit::prune_degenerate_wires`].
    pub fn validate(&self) -> Result<()> {
        for (i, pin) in self.pins.iter().enumerate() {
            check_width(&pin.name, pin.bit_width)?;
            if self.pins[..i].iter().any(|p| p.name == pin.name) {
                return Err(NetlistError::DuplicatePinName(pin.name.clone()));
            }
        }
        for (index, symbol) in self.symbols.iter().enumerate() {
            if symbol.id.0 as usize != index {
                return Err(NetlistError::SymbolIdMismatch {
                    index,
                    id: symbol.id.0,
                });
            }
            match symbol.kind {
                SymbolKind::Gate {
                    gate,
                    inputs,
                    width,
                } => check_gate(gate, inputs, width)?,
                SymbolKind::Pin { pin } => {
                    self.pin(pin)?;
                }
                SymbolKind::Constant { width, .. } => check_width("constant", width)?,
                SymbolKind::Probe { width } => check_width("probe", width)?,
            }
        }
        Ok(())
    }

    /// Jacks of one symbol, inputs first
    pub fn symbol_jacks(&self, symbol: &Symbol) -> Vec<Jack> {
        let at = |index, point, direction, width| Jack {
            symbol: symbol.id,
            index,
            point,
            direction,
            width,
        };
        let p = symbol.position;
        match &symbol.kind {
            SymbolKind::Gate { inputs, width, .. } => {
                let mut jacks: Vec<Jack> = (0..*inputs as i32)
                    .map(|i| at(i as usize, p.offset(0, i), JackDirection::Input, *width))
                    .collect();
                jacks.push(at(
                    *inputs as usize,
                    p.offset(GATE_SPAN, 0),
                    JackDirection::Output,
                    *width,
                ));
                jacks
            }
            SymbolKind::Pin { pin } => {
                let Ok(pin) = self.pin(*pin) else {
                    return Vec::new();
                };
                // Seen from inside the sheet an input pin drives its net.
                let direction = match pin.pin_type {
                    PinType::Input => JackDirection::Output,
                    _ => JackDirection::Input,
                };
                vec![at(0, p, direction, pin.bit_width)]
            }
            SymbolKind::Constant { width, .. } => vec![at(0, p, JackDirection::Output, *width)],
            SymbolKind::Probe { width } => vec![at(0, p, JackDirection::Input, *width)],
        }
    }

    /// Every jack on the sheet
    pub fn jacks(&self) -> impl Iterator<Item = Jack> + '_ {
        self.symbols.iter().flat_map(|s| self.symbol_jacks(s))
    }

    fn push_symbol(&mut self, position: Point, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol { id, position, kind });
        id
    }
}

fn check_width(name: &str, width: u8) -> Result<()> {
    if width == 0 || width > MAX_BIT_WIDTH {
        return Err(NetlistError::InvalidBitWidth {
            name: name.to_string(),
            width,
        });
    }
    Ok(())
}

fn check_gate(gate: GateKind, inputs: u8, width: u8) -> Result<()> {
    if !gate.input_range().contains(&inputs) {
        return Err(NetlistError::InvalidInputCount {
            gate: gate.to_string(),
            inputs,
        });
    }
    check_width(&gate.to_string(), width)
}

/// Mask covering the low `width` bits
pub fn width_mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}
