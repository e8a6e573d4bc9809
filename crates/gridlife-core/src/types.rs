//! Grid geometry shared by the engine

use serde::{Deserialize, Serialize};

/// Grid cell address; rows grow downwards, columns to the right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Coordinate shifted by the given deltas (may leave the grid)
    pub fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }

    /// Euclidean distance to another cell
    pub fn distance(self, other: Coord) -> f32 {
        let d_row = (self.row - other.row) as f32;
        let d_col = (self.col - other.col) as f32;
        (d_row * d_row + d_col * d_col).sqrt()
    }
}

impl From<(i32, i32)> for Coord {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

/// Size of the world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSize {
    pub height: u32,
    pub width: u32,
}

impl WorldSize {
    pub const fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.height as usize * self.width as usize
    }

    /// True if the coordinate lies inside `[0, height) x [0, width)`
    pub fn contains(&self, coord: Coord) -> bool {
        coord.row >= 0
            && coord.col >= 0
            && (coord.row as u32) < self.height
            && (coord.col as u32) < self.width
    }

    /// Row-major cell at `index`
    pub fn coord_at(&self, index: usize) -> Coord {
        let width = self.width.max(1) as usize;
        Coord::new((index / width) as i32, (index % width) as i32)
    }
}

/// Axis-aligned rectangle with inclusive bounds on both axes
///
/// Used for safe boxes and death boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub top_left: Coord,
    pub bottom_right: Coord,
}

impl Region {
    pub fn new(top_left: impl Into<Coord>, bottom_right: impl Into<Coord>) -> Self {
        Self {
            top_left: top_left.into(),
            bottom_right: bottom_right.into(),
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row >= self.top_left.row
            && coord.row <= self.bottom_right.row
            && coord.col >= self.top_left.col
            && coord.col <= self.bottom_right.col
    }
}
