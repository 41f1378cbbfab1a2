//! Squad Tactics - grid combat kernel for real-time squad battles

pub mod battle;
pub mod combat;
pub mod combatant;
pub mod core;
pub mod grid;
pub mod pathfinding;
pub mod spatial;
pub mod status;
pub mod targeting;
pub mod visibility;
