//! Occupancy index: which entities stand where.
//!
//! Tracks `entity -> location` and the ordered occupants of each location.
//! Occupants keep arrival order, so selecting a location yields entities in
//! the order they moved there. Both maps are persistent (`im`) so snapshots
//! share structure.

use im::{OrdMap, Vector};

use super::Coord;

/// Entity location tracking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Occupancy {
    locations: OrdMap<String, Coord>,
    cells: OrdMap<Coord, Vector<String>>,
}

impl Occupancy {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an entity, moving it if already on the map.
    ///
    /// Returns the previous location, if any.
    pub fn place(&mut self, entity: &str, coord: Coord) -> Option<Coord> {
        let old = self.locations.get(entity).copied();
        if old == Some(coord) {
            return old;
        }
        if let Some(old) = old {
            self.detach(entity, old);
        }
        self.locations.insert(entity.to_string(), coord);
        self.cells
            .entry(coord)
            .or_insert_with(Vector::new)
            .push_back(entity.to_string());
        old
    }

    /// Remove an entity from the map.
    ///
    /// Returns the location it was at, or `None` if it wasn't on the map.
    pub fn remove(&mut self, entity: &str) -> Option<Coord> {
        let coord = self.locations.remove(entity)?;
        self.detach(entity, coord);
        Some(coord)
    }

    fn detach(&mut self, entity: &str, coord: Coord) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|occupant| occupant != entity);
            if cell.is_empty() {
                self.cells.remove(&coord);
            }
        }
    }

    #[must_use]
    pub fn location(&self, entity: &str) -> Option<Coord> {
        self.locations.get(entity).copied()
    }

    /// Occupants of a location, in arrival order.
    pub fn at(&self, coord: Coord) -> impl Iterator<Item = &String> + '_ {
        self.cells.get(&coord).into_iter().flat_map(|cell| cell.iter())
    }

    /// Number of entities on the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[must_use]
    pub fn contains(&self, entity: &str) -> bool {
        self.locations.contains_key(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_and_get() {
        let mut map = Occupancy::new();
        let a = Coord::flat(1, 1);

        assert_eq!(map.place("knight", a), None);
        assert_eq!(map.place("archer", a), None);

        assert_eq!(map.location("knight"), Some(a));
        assert_eq!(map.location("ghost"), None);
        let here: Vec<_> = map.at(a).cloned().collect();
        assert_eq!(here, vec!["knight".to_string(), "archer".to_string()]);
    }

    #[test]
    fn test_move_between_cells() {
        let mut map = Occupancy::new();
        let a = Coord::flat(0, 0);
        let b = Coord::flat(0, 1);

        map.place("knight", a);
        assert_eq!(map.place("knight", b), Some(a));

        assert_eq!(map.at(a).count(), 0);
        assert_eq!(map.at(b).count(), 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut map = Occupancy::new();
        map.place("knight", Coord::flat(2, 2));

        assert_eq!(map.remove("knight"), Some(Coord::flat(2, 2)));
        assert_eq!(map.remove("knight"), None);
        assert!(map.is_empty());
        assert!(!map.contains("knight"));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut map = Occupancy::new();
        map.place("knight", Coord::flat(0, 0));
        let snapshot = map.clone();

        map.place("knight", Coord::flat(5, 5));
        assert_eq!(snapshot.location("knight"), Some(Coord::flat(0, 0)));
        assert_ne!(snapshot, map);
    }
}
