//! Grid pathfinding and path following

pub mod agent;
pub mod astar;
pub mod heuristic;

pub use agent::{MovementConfig, PathAgent, StepOutcome};
pub use astar::{path_cost, to_world_centers, Pathfinder, PathfinderConfig};
pub use heuristic::Heuristic;
