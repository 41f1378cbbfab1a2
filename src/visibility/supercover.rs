//! Supercover line rasterisation
//!
//! Bresenham stepping that also emits both shoulder cells whenever the line
//! moves diagonally, so a line cannot slip between two touching corners.

use crate::grid::Cell;

/// Cells covered by the line from `a` to `b`, endpoints included
///
/// The walk always runs from the smaller cell to the larger one, so
/// `supercover(a, b)` and `supercover(b, a)` cover the same cells.
pub fn supercover(a: Cell, b: Cell) -> Vec<Cell> {
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    let mut cells = trace(start, end);
    if start != a {
        cells.reverse();
    }
    cells
}

fn trace(from: Cell, to: Cell) -> Vec<Cell> {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx - dy;

    let mut cells = Vec::with_capacity((dx + dy + 1) as usize);
    let (mut x, mut y) = (from.x, from.y);
    cells.push(from);

    while x != to.x || y != to.y {
        let (px, py) = (x, y);
        let e2 = 2 * err;
        let mut moved_x = false;
        let mut moved_y = false;

        if e2 > -dy {
            err -= dy;
            x += sx;
            moved_x = true;
        }
        if e2 < dx {
            err += dx;
            y += sy;
            moved_y = true;
        }

        if moved_x && moved_y {
            cells.push(Cell::new(x, py));
            cells.push(Cell::new(px, y));
        }
        cells.push(Cell::new(x, y));
    }

    cells
}
