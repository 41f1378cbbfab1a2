//! Distance estimates for grid A*

use serde::{Deserialize, Serialize};

use crate::grid::Cell;

/// Heuristic used to estimate remaining cost to the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Heuristic {
    /// Admissible for 4-way movement
    Manhattan,
    /// Straight-line distance
    Euclidean,
    /// Exact on open terrain with 8-way movement
    #[default]
    Octile,
}

impl Heuristic {
    /// Estimated cost from `a` to `b`
    pub fn estimate(&self, a: Cell, b: Cell) -> f32 {
        let dx = a.x.abs_diff(b.x) as f32;
        let dy = a.y.abs_diff(b.y) as f32;
        match self {
            Heuristic::Manhattan => dx + dy,
            Heuristic::Euclidean => (dx * dx + dy * dy).sqrt(),
            Heuristic::Octile => (dx + dy) + (std::f32::consts::SQRT_2 - 2.0) * dx.min(dy),
        }
    }
}
