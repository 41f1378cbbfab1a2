//! A* pathfinding over a square grid
//!
//! Nodes live in a per-search table and refer to their predecessor by index.
//! The open set may hold stale duplicates; they are skipped when popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::grid::{Cell, GridTerrain};
use crate::pathfinding::heuristic::Heuristic;

const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

/// Search options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfinderConfig {
    pub heuristic: Heuristic,
    pub allow_diagonal: bool,
    /// Forbid a diagonal step when both shoulder cells are impassable
    pub prevent_corner_cut: bool,
    /// Extra weight on `h` that favours nodes closer to the goal
    pub tie_break_weight: f32,
    /// Node expansion budget; `None` searches until the open set empties
    pub max_expansions: Option<usize>,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            heuristic: Heuristic::Octile,
            allow_diagonal: true,
            prevent_corner_cut: true,
            tie_break_weight: 0.001,
            max_expansions: None,
        }
    }
}

/// Search-internal node
#[derive(Debug, Clone)]
struct PathNode {
    cell: Cell,
    g: f32,
    parent: Option<usize>,
    closed: bool,
}

/// Entry in the open set. Ordered for a min-heap on `f`, then `h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenSetEntry {
    index: usize,
    f: OrderedFloat<f32>,
    h: OrderedFloat<f32>,
}

impl Ord for OpenSetEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenSetEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Grid A* search
#[derive(Debug, Clone, Default)]
pub struct Pathfinder {
    config: PathfinderConfig,
}

impl Pathfinder {
    pub fn new(config: PathfinderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PathfinderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PathfinderConfig) {
        self.config = config;
    }

    /// Find a path from `start` to `goal`, both inclusive
    ///
    /// Returns None if either endpoint is out of bounds or impassable, if no
    /// path exists, or if the expansion budget runs out.
    pub fn find_path<T: GridTerrain>(&self, terrain: &T, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
        if !terrain.in_bounds(start) || !terrain.in_bounds(goal) {
            return None;
        }
        if !terrain.is_passable(start) || !terrain.is_passable(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let mut nodes: Vec<PathNode> = Vec::new();
        let mut lookup: AHashMap<Cell, usize> = AHashMap::new();
        let mut open_set = BinaryHeap::new();

        nodes.push(PathNode {
            cell: start,
            g: 0.0,
            parent: None,
            closed: false,
        });
        lookup.insert(start, 0);
        open_set.push(self.entry(0, 0.0, start, goal));

        let mut expanded = 0usize;

        loop {
            if let Some(budget) = self.config.max_expansions {
                if expanded >= budget {
                    tracing::debug!(
                        "path {} -> {} abandoned after {} expansions",
                        start,
                        goal,
                        expanded
                    );
                    return None;
                }
            }

            let Some(current) = open_set.pop() else {
                break;
            };
            if nodes[current.index].closed {
                continue;
            }
            nodes[current.index].closed = true;
            expanded += 1;

            let current_cell = nodes[current.index].cell;
            if current_cell == goal {
                return Some(reconstruct_path(&nodes, current.index));
            }

            let current_g = nodes[current.index].g;
            for (neighbor, step) in self.neighbors(terrain, current_cell) {
                let tentative_g = current_g + step;

                let index = match lookup.get(&neighbor) {
                    Some(&i) => {
                        if nodes[i].closed || tentative_g >= nodes[i].g {
                            continue;
                        }
                        nodes[i].g = tentative_g;
                        nodes[i].parent = Some(current.index);
                        i
                    }
                    None => {
                        let i = nodes.len();
                        nodes.push(PathNode {
                            cell: neighbor,
                            g: tentative_g,
                            parent: Some(current.index),
                            closed: false,
                        });
                        lookup.insert(neighbor, i);
                        i
                    }
                };

                open_set.push(self.entry(index, tentative_g, neighbor, goal));
            }
        }

        tracing::debug!("no path {} -> {} ({} expansions)", start, goal, expanded);
        None
    }

    fn entry(&self, index: usize, g: f32, cell: Cell, goal: Cell) -> OpenSetEntry {
        let h = self.config.heuristic.estimate(cell, goal);
        OpenSetEntry {
            index,
            f: OrderedFloat(g + h + h * self.config.tie_break_weight),
            h: OrderedFloat(h),
        }
    }

    /// Passable neighbours of `cell` with their step costs
    fn neighbors<T: GridTerrain>(&self, terrain: &T, cell: Cell) -> Vec<(Cell, f32)> {
        if !self.config.allow_diagonal {
            return cell
                .neighbors4()
                .into_iter()
                .filter(|n| terrain.in_bounds(*n) && terrain.is_passable(*n))
                .map(|n| (n, 1.0))
                .collect();
        }

        let mut result = Vec::with_capacity(8);
        for n in cell.neighbors8() {
            if !terrain.in_bounds(n) || !terrain.is_passable(n) {
                continue;
            }

            let diagonal = cell.is_diagonal_step(&n);
            if diagonal && self.config.prevent_corner_cut {
                let shoulder_a = Cell::new(n.x, cell.y);
                let shoulder_b = Cell::new(cell.x, n.y);
                if !open(terrain, shoulder_a) && !open(terrain, shoulder_b) {
                    continue;
                }
            }

            result.push((n, if diagonal { DIAGONAL_COST } else { 1.0 }));
        }
        result
    }
}

fn open<T: GridTerrain>(terrain: &T, cell: Cell) -> bool {
    terrain.in_bounds(cell) && terrain.is_passable(cell)
}

/// Walk parent indices back to the start
fn reconstruct_path(nodes: &[PathNode], goal_index: usize) -> Vec<Cell> {
    let mut path = Vec::new();
    let mut current = Some(goal_index);
    while let Some(i) = current {
        path.push(nodes[i].cell);
        current = nodes[i].parent;
    }
    path.reverse();
    path
}

/// Sum of step costs along a path (1 orthogonal, sqrt 2 diagonal)
pub fn path_cost(path: &[Cell]) -> f32 {
    path.windows(2)
        .map(|w| {
            if w[0].is_diagonal_step(&w[1]) {
                DIAGONAL_COST
            } else {
                w[0].distance(&w[1])
            }
        })
        .sum()
}

/// Convert a cell path to world-space waypoints
pub fn to_world_centers<T: GridTerrain>(terrain: &T, path: &[Cell]) -> Vec<Vec2> {
    path.iter().map(|c| terrain.cell_to_world_center(*c)).collect()
}
