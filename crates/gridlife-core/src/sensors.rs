//! Environment sensing: hazard risk and the brain input vector

use gridlife_genome::InputVector;

use crate::rng::SimRng;
use crate::types::{Coord, WorldSize};
use crate::world::Occupancy;

/// Risk above this kills an individual
pub const DEFAULT_HAZARD_THRESHOLD: f32 = 0.1;

/// Moore neighborhood, in input-vector order:
/// top-left, top, top-right, left, right, bottom-left, bottom, bottom-right
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Heat sources and the risk level individuals can tolerate
#[derive(Debug, Clone, PartialEq)]
pub struct HeatMap {
    sources: Vec<Coord>,
    threshold: f32,
}

impl HeatMap {
    pub fn new(sources: Vec<Coord>, threshold: f32) -> Self {
        Self { sources, threshold }
    }

    pub fn sources(&self) -> &[Coord] {
        &self.sources
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Hazard risk at a cell: sum of reciprocal distances to every heat
    /// source, rounded to 3 decimals
    ///
    /// Returns `None` when the cell is a heat source itself.
    pub fn risk_at(&self, coord: Coord) -> Option<f32> {
        let mut risk = 0.0;
        for &source in &self.sources {
            let distance = coord.distance(source);
            if distance == 0.0 {
                return None;
            }
            risk += 1.0 / distance;
        }
        Some(round3(risk))
    }

    /// Risk at the cell if it is survivable, `None` if it is lethal
    pub fn survivable_risk(&self, coord: Coord) -> Option<f32> {
        self.risk_at(coord).filter(|&risk| risk <= self.threshold)
    }
}

impl Default for HeatMap {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_HAZARD_THRESHOLD)
    }
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

/// Build the 16-element brain input for an individual at `coord`
///
/// Neighborhood slots are 1.0 for an occupied in-bounds cell and 0.0
/// otherwise (including off-grid cells).
pub fn build_input_vector<R: SimRng + ?Sized>(
    coord: Coord,
    world_size: WorldSize,
    occupancy: &Occupancy,
    hazard_risk: f32,
    step: u32,
    lifespan: u32,
    rng: &mut R,
) -> InputVector {
    let mut input = [0.0; 16];

    input[0] = coord.row as f32;
    input[1] = world_size.height as f32 - coord.row as f32 - 1.0;
    input[2] = coord.col as f32;
    input[3] = world_size.width as f32 - coord.col as f32 - 1.0;

    for (slot, (d_row, d_col)) in NEIGHBOR_OFFSETS.iter().enumerate() {
        let neighbor = coord.offset(*d_row, *d_col);
        if world_size.contains(neighbor) && occupancy.is_occupied(neighbor) {
            input[4 + slot] = 1.0;
        }
    }

    input[12] = hazard_risk;
    input[13] = if lifespan == 0 {
        0.0
    } else {
        round3(step as f32 / lifespan as f32)
    };
    input[14] = rng.noise();
    input[15] = rng.noise();

    input
}
