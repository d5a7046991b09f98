//! Shot resolution against a player's own board.

use log::debug;

use crate::grid::{Cell, Coord, Grid, TargetCell};
use crate::ship::Ship;

/// Result of resolving a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Hit,
    Miss,
    /// The cell had already been shot; the board is unchanged.
    AlreadyShot,
}

impl ShotOutcome {
    /// The wire-level impact, `None` for `AlreadyShot`.
    pub fn impact(self) -> Option<Impact> {
        match self {
            ShotOutcome::Hit => Some(Impact::Hit),
            ShotOutcome::Miss => Some(Impact::Miss),
            ShotOutcome::AlreadyShot => None,
        }
    }
}

/// What a shot did, as reported to the shooter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Hit,
    Miss,
}

impl From<Impact> for TargetCell {
    fn from(impact: Impact) -> Self {
        match impact {
            Impact::Hit => TargetCell::Hit,
            Impact::Miss => TargetCell::Miss,
        }
    }
}

impl From<Impact> for Cell {
    fn from(impact: Impact) -> Self {
        match impact {
            Impact::Hit => Cell::Hit,
            Impact::Miss => Cell::Miss,
        }
    }
}

/// Full report of one resolved shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotReport {
    pub outcome: ShotOutcome,
    /// The ship this shot sank, if any.
    pub sunk: Option<Ship>,
    /// True when this shot sank the last afloat ship.
    pub fleet_destroyed: bool,
}

/// Resolve a shot at `coord` on `grid`, whose ships are `ships`.
///
/// `ShipPart` becomes `Hit`; `Empty` and `Blocked` become `Miss`. A cell
/// that is already `Hit` or `Miss` yields `AlreadyShot` and nothing changes.
pub fn resolve(grid: &mut Grid<Cell>, ships: &[Ship], coord: Coord) -> ShotReport {
    let outcome = match grid.get(coord) {
        Cell::Hit | Cell::Miss => ShotOutcome::AlreadyShot,
        Cell::ShipPart => {
            grid.set(coord, Cell::Hit);
            ShotOutcome::Hit
        }
        Cell::Empty | Cell::Blocked => {
            grid.set(coord, Cell::Miss);
            ShotOutcome::Miss
        }
    };

    let mut sunk = None;
    let mut fleet_destroyed = false;
    if outcome == ShotOutcome::Hit {
        sunk = ships
            .iter()
            .find(|ship| ship.contains(coord))
            .filter(|ship| ship.is_sunk(grid))
            .cloned();
        if sunk.is_some() {
            fleet_destroyed = fleet_sunk(grid, ships);
        }
    }
    debug!(
        target: "torpedo::shot",
        "shot at {} -> {:?} (sunk: {}, fleet destroyed: {})",
        coord,
        outcome,
        sunk.is_some(),
        fleet_destroyed
    );
    ShotReport {
        outcome,
        sunk,
        fleet_destroyed,
    }
}

/// True iff there is at least one ship and every cell of every ship is `Hit`.
pub fn fleet_sunk(grid: &Grid<Cell>, ships: &[Ship]) -> bool {
    !ships.is_empty() && ships.iter().all(|ship| ship.is_sunk(grid))
}
