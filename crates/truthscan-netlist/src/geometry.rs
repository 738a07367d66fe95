//! Lattice geometry: points and wire segments

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the integer drawing lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by a lattice offset
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Index of a wire within its circuit sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireId(pub u32);

/// A straight wire segment between two distinct lattice points
///
/// Degenerate wires (`p1 == p2`) are rejected by [`crate::Circuit::add_wire`]
/// and never reach connectivity analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    pub p1: Point,
    pub p2: Point,
}

impl Wire {
    pub fn new(p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self {
            p1: p1.into(),
            p2: p2.into(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.p1 == self.p2
    }

    /// Both endpoints, in declaration order
    pub fn endpoints(&self) -> [Point; 2] {
        [self.p1, self.p2]
    }

    pub fn touches(&self, point: Point) -> bool {
        self.p1 == point || self.p2 == point
    }
}
