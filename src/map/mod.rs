//! Map coordinates and the occupancy index.
//!
//! The map is a sparse integer grid. Topology (adjacency, distance metrics,
//! path search) belongs to board collaborators; the engine only needs to know
//! where entities stand and whether a location exists.
//!
//! ## Key Types
//!
//! - `Coord`: Integer triple `(x, y, z)`; two-integer forms use `z = 0`
//! - `Bounds`: Inclusive box of valid locations
//! - `Occupancy`: Entity location tracking, indexed both ways

pub mod occupancy;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use occupancy::Occupancy;

/// A map location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Coord {
    #[must_use]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// A location on the ground plane (`z = 0`).
    #[must_use]
    pub const fn flat(x: i64, y: i64) -> Self {
        Self { x, y, z: 0 }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Inclusive bounding box of valid locations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Coord,
    pub max: Coord,
}

impl Bounds {
    #[must_use]
    pub const fn new(min: Coord, max: Coord) -> Self {
        Self { min, max }
    }

    /// A `width x height` ground-plane board starting at the origin.
    #[must_use]
    pub const fn grid(width: i64, height: i64) -> Self {
        Self {
            min: Coord::flat(0, 0),
            max: Coord::flat(width - 1, height - 1),
        }
    }

    #[must_use]
    pub fn contains(&self, coord: Coord) -> bool {
        (self.min.x..=self.max.x).contains(&coord.x)
            && (self.min.y..=self.max.y).contains(&coord.y)
            && (self.min.z..=self.max.z).contains(&coord.z)
    }
}
