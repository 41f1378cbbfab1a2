//! Rectangular tile map implementing `GridTerrain`

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::grid::cell::Cell;
use crate::grid::terrain::{GridTerrain, TerrainChange};

/// Contents of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Floor, // Walkable, see-through
    Wall, // Blocks movement and sight
    Pit,  // Blocks movement, see-through
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        matches!(self, Tile::Floor)
    }

    pub fn blocks_sight(&self) -> bool {
        matches!(self, Tile::Wall)
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Tile::Floor),
            '#' => Some(Tile::Wall),
            '~' => Some(Tile::Pit),
            _ => None,
        }
    }
}

/// Handle returned by `TileMap::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type TerrainListener = Box<dyn FnMut(&TerrainChange)>;

/// Dense row-major tile storage with a world-space placement
pub struct TileMap {
    width: u32,
    height: u32,
    cell_size: f32,
    origin: Vec2,
    tiles: Vec<Tile>,
    version: u64,
    next_listener: u64,
    listeners: Vec<(ListenerId, TerrainListener)>,
}

impl std::fmt::Debug for TileMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("cell_size", &self.cell_size)
            .field("origin", &self.origin)
            .field("version", &self.version)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TileMap {
    /// Create an open map of floor tiles with unit cell size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cell_size: 1.0,
            origin: Vec2::ZERO,
            tiles: vec![Tile::Floor; width as usize * height as usize],
            version: 0,
            next_listener: 0,
            listeners: Vec::new(),
        }
    }

    /// Build a map from text rows; row `i` becomes `y = i`
    ///
    /// `.` is floor, `#` wall, `~` pit. Unknown characters are floor.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut map = Self::new(width, height);

        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let tile = Tile::from_char(c).unwrap_or_default();
                let idx = y * width as usize + x;
                map.tiles[idx] = tile;
            }
        }

        map
    }

    /// Place the map in world space
    pub fn with_placement(mut self, cell_size: f32, origin: Vec2) -> Self {
        self.cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        self.origin = origin;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            None
        }
    }

    /// Tile at a cell, `None` outside the map
    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        self.index(cell).map(|i| self.tiles[i])
    }

    /// Replace a tile. Returns true if the map changed.
    pub fn set_tile(&mut self, cell: Cell, tile: Tile) -> bool {
        let Some(idx) = self.index(cell) else {
            return false;
        };
        if self.tiles[idx] == tile {
            return false;
        }

        self.tiles[idx] = tile;
        self.touch(cell);
        true
    }

    pub fn place_wall(&mut self, cell: Cell) -> bool {
        self.set_tile(cell, Tile::Wall)
    }

    pub fn remove_wall(&mut self, cell: Cell) -> bool {
        if self.tile(cell) == Some(Tile::Wall) {
            self.set_tile(cell, Tile::Floor)
        } else {
            false
        }
    }

    pub fn clear_cell(&mut self, cell: Cell) -> bool {
        self.set_tile(cell, Tile::Floor)
    }

    /// All cells currently holding a wall
    pub fn blocked_cells(&self) -> Vec<Cell> {
        self.cells()
            .filter(|c| self.tile(*c) == Some(Tile::Wall))
            .collect()
    }

    /// Every in-bounds cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| Cell::new(x, y)))
    }

    /// Register a closure called after every mutation
    pub fn subscribe(&mut self, listener: impl FnMut(&TerrainChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn touch(&mut self, cell: Cell) {
        self.version += 1;
        let change = TerrainChange {
            version: self.version,
            cell,
        };
        tracing::trace!("terrain changed at {} (version {})", cell, self.version);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

impl GridTerrain for TileMap {
    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width as i32 && cell.y < self.height as i32
    }

    fn is_passable(&self, cell: Cell) -> bool {
        self.tile(cell).is_some_and(|t| t.is_passable())
    }

    fn is_blocking(&self, cell: Cell) -> bool {
        self.tile(cell).is_some_and(|t| t.blocks_sight())
    }

    fn cell_to_world_center(&self, cell: Cell) -> Vec2 {
        Vec2::new(
            self.origin.x + (cell.x as f32 + 0.5) * self.cell_size,
            self.origin.y + (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    fn world_to_cell(&self, point: Vec2) -> Cell {
        Cell::new(
            ((point.x - self.origin.x) / self.cell_size).floor() as i32,
            ((point.y - self.origin.y) / self.cell_size).floor() as i32,
        )
    }

    fn version(&self) -> u64 {
        self.version
    }
}
