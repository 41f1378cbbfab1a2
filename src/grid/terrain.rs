//! Terrain query surface consumed by the kernel
//!
//! Map storage and tile authoring live outside the kernel; everything here
//! only asks questions about cells.

use crate::core::types::Vec2;
use crate::grid::cell::Cell;

/// Read-only view of the battlefield terrain
///
/// `version` must change on every mutation that can alter passability or
/// sight blocking. Caches keyed on terrain state compare versions instead of
/// subscribing to callbacks.
pub trait GridTerrain {
    /// Is the cell inside the map?
    fn in_bounds(&self, cell: Cell) -> bool;

    /// Can a unit stand on / walk through this cell?
    fn is_passable(&self, cell: Cell) -> bool;

    /// Does this cell block line of sight?
    fn is_blocking(&self, cell: Cell) -> bool;

    /// World-space centre of a cell
    fn cell_to_world_center(&self, cell: Cell) -> Vec2;

    /// Cell containing a world-space point
    fn world_to_cell(&self, point: Vec2) -> Cell;

    /// Monotonic mutation counter
    fn version(&self) -> u64;
}

impl<T: GridTerrain + ?Sized> GridTerrain for &T {
    fn in_bounds(&self, cell: Cell) -> bool {
        (**self).in_bounds(cell)
    }

    fn is_passable(&self, cell: Cell) -> bool {
        (**self).is_passable(cell)
    }

    fn is_blocking(&self, cell: Cell) -> bool {
        (**self).is_blocking(cell)
    }

    fn cell_to_world_center(&self, cell: Cell) -> Vec2 {
        (**self).cell_to_world_center(cell)
    }

    fn world_to_cell(&self, point: Vec2) -> Cell {
        (**self).world_to_cell(point)
    }

    fn version(&self) -> u64 {
        (**self).version()
    }
}

/// Notification fired after the terrain mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainChange {
    /// Terrain version after the mutation
    pub version: u64,
    /// The cell that changed
    pub cell: Cell,
}
