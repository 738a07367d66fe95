//! Four-State Logic Values
//!
//! Every signal bit is one of four states. Each state has a fixed 2-bit
//! code, and a signal of up to 32 bits packs into one `u64`:
//!
//! | State      | Code | Meaning                          |
//! |------------|------|----------------------------------|
//! | `Floating` | `00` | nothing drives the bit           |
//! | `Zero`     | `01` | driven to logical 0              |
//! | `One`      | `10` | driven to logical 1              |
//! | `Conflict` | `11` | driven to both 0 and 1, unknown  |
//!
//! Bit `i` of a signal occupies bits `2i..2i+2` of the packed word.
//!
//! With this code, resolving several drivers of one net is a bitwise OR:
//! `Floating` is the identity, `Zero | One == Conflict`, and `Conflict`
//! absorbs everything.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single signal bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogicState {
    #[default]
    Floating = 0b00,
    Zero = 0b01,
    One = 0b10,
    Conflict = 0b11,
}

impl LogicState {
    /// Decode a 2-bit code; higher bits are ignored
    pub const fn from_code(code: u64) -> Self {
        match code & 0b11 {
            0b00 => LogicState::Floating,
            0b01 => LogicState::Zero,
            0b10 => LogicState::One,
            _ => LogicState::Conflict,
        }
    }

    pub const fn code(self) -> u64 {
        self as u64
    }

    pub const fn from_bool(value: bool) -> Self {
        if value {
            LogicState::One
        } else {
            LogicState::Zero
        }
    }

    /// Binary value, `None` for floating or conflicting bits
    pub const fn to_bool(self) -> Option<bool> {
        match self {
            LogicState::Zero => Some(false),
            LogicState::One => Some(true),
            _ => None,
        }
    }

    pub const fn is_binary(self) -> bool {
        matches!(self, LogicState::Zero | LogicState::One)
    }

    /// Combine two drivers of the same bit
    pub const fn resolve(self, other: LogicState) -> Self {
        Self::from_code(self.code() | other.code())
    }

    pub const fn symbol(self) -> char {
        match self {
            LogicState::Floating => 'Z',
            LogicState::Zero => '0',
            LogicState::One => '1',
            LogicState::Conflict => 'X',
        }
    }
}

impl fmt::Display for LogicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Up to 32 logic states packed two bits each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PackedState(pub u64);

impl PackedState {
    /// All bits floating
    pub const FLOATING: PackedState = PackedState(0);

    /// Encode a binary value of `width` bits
    pub fn from_value(value: u32, width: u8) -> Self {
        let mut packed = 0u64;
        for bit in 0..width.min(32) {
            let state = LogicState::from_bool((value >> bit) & 1 == 1);
            packed |= state.code() << (2 * bit as u32);
        }
        PackedState(packed)
    }

    /// Encode states given least-significant bit first
    pub fn from_states(states: &[LogicState]) -> Self {
        let packed = states
            .iter()
            .take(32)
            .enumerate()
            .fold(0u64, |acc, (bit, s)| acc | s.code() << (2 * bit as u32));
        PackedState(packed)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// State of bit `bit`; bits at or beyond 32 read as floating
    pub fn state(self, bit: u8) -> LogicState {
        if bit >= 32 {
            return LogicState::Floating;
        }
        LogicState::from_code(self.0 >> (2 * bit as u32))
    }

    pub fn with_state(self, bit: u8, state: LogicState) -> Self {
        if bit >= 32 {
            return self;
        }
        let shift = 2 * bit as u32;
        PackedState((self.0 & !(0b11 << shift)) | (state.code() << shift))
    }

    pub const fn resolve(self, other: PackedState) -> Self {
        PackedState(self.0 | other.0)
    }

    /// Keep only the low `width` bits
    pub fn truncate(self, width: u8) -> Self {
        if width >= 32 {
            self
        } else {
            PackedState(self.0 & ((1u64 << (2 * width as u32)) - 1))
        }
    }

    /// Binary value of the low `width` bits, `None` if any is not binary
    pub fn decode(self, width: u8) -> Option<u32> {
        let mut value = 0u32;
        for bit in 0..width.min(32) {
            if self.state(bit).to_bool()? {
                value |= 1 << bit;
            }
        }
        Some(value)
    }

    pub fn is_determinate(self, width: u8) -> bool {
        (0..width.min(32)).all(|bit| self.state(bit).is_binary())
    }

    /// Most significant bit first, one `0/1/Z/X` character per bit
    pub fn to_bit_string(self, width: u8) -> String {
        (0..width.min(32))
            .rev()
            .map(|bit| self.state(bit).symbol())
            .collect()
    }
}
