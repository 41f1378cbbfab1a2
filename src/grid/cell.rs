//! Square grid cell coordinates
//!
//! Cells are plain value keys: equality and hashing are structural.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Integer grid coordinate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, Display,
)]
#[display(fmt = "({}, {})", x, y)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared Euclidean distance in cells
    pub fn distance_squared(&self, other: &Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }

    /// Euclidean distance in cells
    pub fn distance(&self, other: &Self) -> f32 {
        (self.distance_squared(other) as f32).sqrt()
    }

    /// Number of 4-way steps between two cells
    pub fn manhattan(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Number of 8-way steps between two cells
    pub fn chebyshev(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// True when `other` is exactly one diagonal step away
    pub fn is_diagonal_step(&self, other: &Self) -> bool {
        self.x.abs_diff(other.x) == 1 && self.y.abs_diff(other.y) == 1
    }

    /// The four orthogonal neighbours (east, west, north, south)
    pub fn neighbors4(&self) -> [Cell; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    /// All eight neighbours, column by column from the lower-left
    pub fn neighbors8(&self) -> [Cell; 8] {
        [
            self.offset(-1, -1),
            self.offset(-1, 0),
            self.offset(-1, 1),
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(1, -1),
            self.offset(1, 0),
            self.offset(1, 1),
        ]
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
