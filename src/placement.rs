//! Placement legality: bounds, overlap, and the one-cell gap between ships.
//!
//! Every function here is a pure query over a board; nothing is mutated.

use crate::common::ValidationError;
use crate::grid::{Cell, Coord, Grid};
use crate::ship::{Orientation, Ship};

/// Check a whole ship at once and report the first violation.
///
/// Each cell must be on the board, must not be a `ShipPart`, and must not
/// touch a `ShipPart` in its 8-neighbourhood. The ship's own cells are not
/// checked against each other.
pub fn check(
    grid: &Grid<Cell>,
    origin: Coord,
    length: usize,
    orientation: Orientation,
) -> Result<Ship, ValidationError> {
    let ship = Ship::new(origin, length, orientation)?;
    for &cell in ship.cells() {
        if grid.get(cell) == Cell::ShipPart {
            return Err(ValidationError::Occupied(cell));
        }
        if cell.neighbors().any(|n| grid.get(n) == Cell::ShipPart) {
            return Err(ValidationError::Occupied(cell));
        }
    }
    Ok(ship)
}

/// Whether a ship of `length` may be placed at `origin` along `orientation`.
pub fn can_place(grid: &Grid<Cell>, origin: Coord, length: usize, orientation: Orientation) -> bool {
    check(grid, origin, length, orientation).is_ok()
}

/// Positions tried, in order, when a requested placement does not fit:
/// the requested orientation, the opposite one, then the ship grown upward
/// and leftward so that it ends at `origin`.
pub fn fallback_candidates(
    origin: Coord,
    length: usize,
    orientation: Orientation,
) -> [(Coord, Orientation); 4] {
    let back = length.saturating_sub(1);
    let upward = Coord::new(origin.row().saturating_sub(back), origin.col()).unwrap_or(origin);
    let leftward = Coord::new(origin.row(), origin.col().saturating_sub(back)).unwrap_or(origin);
    [
        (origin, orientation),
        (origin, orientation.flipped()),
        (upward, Orientation::Vertical),
        (leftward, Orientation::Horizontal),
    ]
}

/// First legal position from [`fallback_candidates`].
pub fn find_placement(
    grid: &Grid<Cell>,
    origin: Coord,
    length: usize,
    orientation: Orientation,
) -> Option<Ship> {
    fallback_candidates(origin, length, orientation)
        .into_iter()
        .find_map(|(at, orient)| check(grid, at, length, orient).ok())
}
