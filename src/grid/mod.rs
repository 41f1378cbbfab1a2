//! Grid coordinates and the terrain collaborator

pub mod cell;
pub mod terrain;
pub mod tile_map;

pub use cell::Cell;
pub use terrain::{GridTerrain, TerrainChange};
pub use tile_map::{ListenerId, Tile, TileMap};
