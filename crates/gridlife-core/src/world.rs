//! Grid occupancy and random placement

use ahash::HashSet;
use rand::seq::index;
use rand::Rng;

use crate::error::EngineError;
use crate::types::{Coord, WorldSize};

/// Set of occupied cells
///
/// Holds the coordinates of every placed individual. Updated in place during
/// a step pass, so later individuals see earlier moves and deaths.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    cells: HashSet<Coord>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the cell is taken
    pub fn is_occupied(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }

    /// Mark a cell as taken; returns false if it already was
    pub fn insert(&mut self, coord: Coord) -> bool {
        self.cells.insert(coord)
    }

    /// Free a cell; returns false if it was not taken
    pub fn remove(&mut self, coord: Coord) -> bool {
        self.cells.remove(&coord)
    }

    /// Move an occupant from one cell to another
    pub fn relocate(&mut self, from: Coord, to: Coord) {
        self.cells.remove(&from);
        self.cells.insert(to);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coord> {
        self.cells.iter()
    }
}

impl FromIterator<Coord> for Occupancy {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// Draw `count` distinct cells uniformly at random
///
/// The result is in random order, so zipping it with a population gives a
/// random placement.
pub fn random_coordinates<R: Rng + ?Sized>(
    count: usize,
    world_size: WorldSize,
    rng: &mut R,
) -> Result<Vec<Coord>, EngineError> {
    let capacity = world_size.cell_count();
    if count > capacity {
        return Err(EngineError::PopulationTooLarge {
            requested: count,
            capacity,
        });
    }

    Ok(index::sample(rng, capacity, count)
        .into_iter()
        .map(|cell| world_size.coord_at(cell))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_occupancy_insert_remove() {
        let mut occupancy = Occupancy::new();

        assert!(occupancy.insert(Coord::new(1, 1)));
        assert!(!occupancy.insert(Coord::new(1, 1)));
        assert!(occupancy.is_occupied(Coord::new(1, 1)));
        assert_eq!(occupancy.len(), 1);

        assert!(occupancy.remove(Coord::new(1, 1)));
        assert!(!occupancy.remove(Coord::new(1, 1)));
        assert!(occupancy.is_empty());
    }

    #[test]
    fn test_occupancy_relocate() {
        let mut occupancy: Occupancy = [Coord::new(0, 0), Coord::new(0, 1)].into_iter().collect();

        occupancy.relocate(Coord::new(0, 0), Coord::new(1, 0));

        assert!(!occupancy.is_occupied(Coord::new(0, 0)));
        assert!(occupancy.is_occupied(Coord::new(1, 0)));
        assert!(occupancy.is_occupied(Coord::new(0, 1)));
        assert_eq!(occupancy.len(), 2);
    }

    #[test]
    fn test_occupancy_iter() {
        let mut occupancy: Occupancy = [Coord::new(2, 2), Coord::new(0, 1)].into_iter().collect();
        occupancy.remove(Coord::new(2, 2));
        occupancy.insert(Coord::new(4, 0));

        let mut cells: Vec<Coord> = occupancy.iter().copied().collect();
        cells.sort();

        assert_eq!(cells, vec![Coord::new(0, 1), Coord::new(4, 0)]);
    }

    #[test]
    fn test_random_coordinates_distinct_and_in_bounds() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let world = WorldSize::new(5, 7);

        let coords = random_coordinates(20, world, &mut rng).unwrap();
        let unique: Occupancy = coords.iter().copied().collect();

        assert_eq!(coords.len(), 20);
        assert_eq!(unique.len(), 20);
        assert!(coords.iter().all(|&c| world.contains(c)));
    }

    #[test]
    fn test_random_coordinates_fills_grid() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        let world = WorldSize::new(3, 3);

        let coords = random_coordinates(9, world, &mut rng).unwrap();
        let unique: Occupancy = coords.iter().copied().collect();

        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn test_random_coordinates_too_many() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);

        let result = random_coordinates(5, WorldSize::new(2, 2), &mut rng);

        assert_eq!(
            result,
            Err(EngineError::PopulationTooLarge {
                requested: 5,
                capacity: 4
            })
        );
    }

    #[test]
    fn test_random_coordinates_empty() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);

        let coords = random_coordinates(0, WorldSize::new(2, 2), &mut rng).unwrap();
        assert!(coords.is_empty());
    }
}
