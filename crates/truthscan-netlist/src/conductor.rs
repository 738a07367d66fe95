//! Conductor Extraction
//!
//! Partitions the wires of one sheet into conductors: maximal sets of wires
//! joined transitively through shared endpoints. Every conductor also keeps
//! an incidence count per endpoint, i.e. how many wire ends land on it.
//!
//! # Algorithm
//!
//! A single pass over the wires. For a wire `p1 - p2`:
//!
//! 1. both endpoints known and owned by different conductors: the conductor
//!    owning `p2` is merged into the one owning `p1`
//! 2. one endpoint known: the other endpoint joins that conductor
//! 3. neither known: a fresh conductor is created
//!
//! The wire is then added to the resolved conductor. The resulting partition
//! does not depend on wire order; only which conductor id survives a merge does.

use crate::geometry::{Point, Wire, WireId};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Identifier of a conductor inside its [`ConductorMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConductorId(pub u32);

/// A connected set of wires plus endpoint incidence counts
#[derive(Debug, Clone)]
pub struct Conductor {
    id: ConductorId,
    wires: Vec<WireId>,
    points: IndexMap<Point, u32>,
}

impl Conductor {
    fn new(id: ConductorId) -> Self {
        Self {
            id,
            wires: Vec::new(),
            points: IndexMap::new(),
        }
    }

    pub fn id(&self) -> ConductorId {
        self.id
    }

    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    /// Endpoints with their incidence counts
    pub fn points(&self) -> impl Iterator<Item = (Point, u32)> + '_ {
        self.points.iter().map(|(p, c)| (*p, *c))
    }

    pub fn contains(&self, wire: WireId) -> bool {
        self.wires.contains(&wire)
    }

    pub fn contains_point(&self, point: Point) -> bool {
        self.points.contains_key(&point)
    }

    /// Number of wire ends landing on `point`, 0 if the point is not part of
    /// this conductor
    pub fn junction_count(&self, point: Point) -> u32 {
        self.points.get(&point).copied().unwrap_or(0)
    }

    fn add(&mut self, id: WireId, wire: &Wire) {
        self.wires.push(id);
        for p in wire.endpoints() {
            *self.points.entry(p).or_insert(0) += 1;
        }
    }

    fn absorb(&mut self, other: Conductor) {
        self.wires.extend(other.wires);
        for (p, count) in other.points {
            *self.points.entry(p).or_insert(0) += count;
        }
    }
}

/// All conductors of one circuit sheet
///
/// Built once from the sheet's wires; a structural wire change means
/// building a new map.
#[derive(Debug, Clone, Default)]
pub struct ConductorMap {
    wires: Vec<Wire>,
    point_map: HashMap<Point, ConductorId>,
    /// Arena indexed by `ConductorId`; merged-away conductors leave `None`
    conductors: Vec<Option<Conductor>>,
}

impl ConductorMap {
    pub fn new(wires: &[Wire]) -> Self {
        let mut map = Self {
            wires: wires.to_vec(),
            point_map: HashMap::with_capacity(wires.len() * 2),
            conductors: Vec::new(),
        };
        for (index, wire) in wires.iter().enumerate() {
            let id = map.resolve(wire.p1, wire.p2);
            if let Some(conductor) = map.conductors[id.0 as usize].as_mut() {
                conductor.add(WireId(index as u32), wire);
            }
        }
        map
    }

    /// Find or create the conductor a wire between `p1` and `p2` belongs to,
    /// merging conductors bridged by the wire
    fn resolve(&mut self, p1: Point, p2: Point) -> ConductorId {
        match (
            self.point_map.get(&p1).copied(),
            self.point_map.get(&p2).copied(),
        ) {
            (Some(c1), Some(c2)) if c1 != c2 => {
                self.merge(c1, c2);
                c1
            }
            (Some(c1), Some(_)) => c1,
            (Some(c1), None) => {
                self.point_map.insert(p2, c1);
                c1
            }
            (None, Some(c2)) => {
                self.point_map.insert(p1, c2);
                c2
            }
            (None, None) => {
                let id = ConductorId(self.conductors.len() as u32);
                self.conductors.push(Some(Conductor::new(id)));
                self.point_map.insert(p1, id);
                self.point_map.insert(p2, id);
                id
            }
        }
    }

    fn merge(&mut self, survivor: ConductorId, merged: ConductorId) {
        let Some(victim) = self.conductors[merged.0 as usize].take() else {
            return;
        };
        for point in victim.points.keys() {
            self.point_map.insert(*point, survivor);
        }
        if let Some(target) = self.conductors[survivor.0 as usize].as_mut() {
            target.absorb(victim);
        }
    }

    /// Conductor owning `point`, if any wire ends there
    pub fn conductor_at(&self, point: Point) -> Option<&Conductor> {
        let id = self.point_map.get(&point)?;
        self.conductors[id.0 as usize].as_ref()
    }

    /// Conductor containing `wire`
    pub fn conductor_of(&self, wire: WireId) -> Option<&Conductor> {
        let w = self.wires.get(wire.0 as usize)?;
        self.conductor_at(w.p1)
    }

    pub fn conductor(&self, id: ConductorId) -> Option<&Conductor> {
        self.conductors.get(id.0 as usize)?.as_ref()
    }

    /// Live conductors in creation order
    pub fn conductors(&self) -> impl Iterator<Item = &Conductor> + '_ {
        self.conductors.iter().flatten()
    }

    pub fn conductor_count(&self) -> usize {
        self.conductors().count()
    }

    pub fn junction_count(&self, point: Point) -> u32 {
        self.conductor_at(point)
            .map(|c| c.junction_count(point))
            .unwrap_or(0)
    }

    /// Every point whose incidence count is at least `min_count`
    pub fn junction_points(&self, min_count: u32) -> impl Iterator<Item = Point> + '_ {
        self.conductors()
            .flat_map(|c| c.points())
            .filter(move |(_, count)| *count >= min_count)
            .map(|(p, _)| p)
    }

    /// Wires with a dangling end: an endpoint of incidence 1 that touches
    /// none of the given device jacks
    pub fn free_wires<'a>(
        &'a self,
        jack_points: &'a HashSet<Point>,
    ) -> impl Iterator<Item = WireId> + 'a {
        self.wires.iter().enumerate().filter_map(move |(i, w)| {
            let dangling = w
                .endpoints()
                .into_iter()
                .any(|p| self.junction_count(p) == 1 && !jack_points.contains(&p));
            dangling.then_some(WireId(i as u32))
        })
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }
}
