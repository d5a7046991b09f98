//! Fleet placement: the ships a player has placed, the lengths still to
//! place, and the own board they are drawn on.

use log::debug;
use rand::Rng;

use crate::common::ValidationError;
use crate::config::BOARD_SIZE;
use crate::grid::{Cell, Coord, Grid};
use crate::placement;
use crate::ship::{Orientation, Ship};

/// Random attempts per ship before a whole-fleet retry.
const ATTEMPTS_PER_SHIP: usize = 100;
/// Whole-fleet retries in [`FleetManager::auto_place`].
const FLEET_ROUNDS: usize = 20;

/// A ship being built cell by cell.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    length: usize,
    cells: Vec<Coord>,
    /// Locked after the second cell.
    axis: Option<Orientation>,
}

impl Selection {
    /// Validate `coord` as the next cell, without touching the board.
    fn accepts(&self, coord: Coord) -> Result<(), ValidationError> {
        let Some(&first) = self.cells.first() else {
            return Ok(());
        };
        let axis = match self.axis {
            Some(axis) => axis,
            None if first.row() == coord.row() => Orientation::Horizontal,
            None if first.col() == coord.col() => Orientation::Vertical,
            None => return Err(ValidationError::AxisMismatch(coord)),
        };
        let on_axis = match axis {
            Orientation::Horizontal => coord.row() == first.row(),
            Orientation::Vertical => coord.col() == first.col(),
        };
        if !on_axis {
            return Err(ValidationError::AxisMismatch(coord));
        }
        Ok(())
    }

    fn extends(&self, coord: Coord) -> bool {
        let (Some(low), Some(high)) = (self.cells.iter().min(), self.cells.iter().max()) else {
            return true;
        };
        low.is_orthogonal_neighbor(coord) || high.is_orthogonal_neighbor(coord)
    }
}

/// Placement state of one player's fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetManager {
    grid: Grid<Cell>,
    ships: Vec<Ship>,
    pending: Vec<usize>,
    selection: Option<Selection>,
}

impl FleetManager {
    /// Empty board with `lengths` waiting to be placed.
    pub fn new(lengths: &[usize]) -> Self {
        Self {
            grid: Grid::default(),
            ships: Vec::new(),
            pending: lengths.to_vec(),
            selection: None,
        }
    }

    /// The own board.
    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Lengths still to be placed.
    pub fn pending_lengths(&self) -> &[usize] {
        &self.pending
    }

    /// Length and cells of the ship currently being selected.
    pub fn selection(&self) -> Option<(usize, &[Coord])> {
        self.selection
            .as_ref()
            .map(|s| (s.length, s.cells.as_slice()))
    }

    /// True when every ship is placed and no selection is open.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.selection.is_none()
    }

    /// Board and ships for shot resolution.
    pub(crate) fn battle_parts(&mut self) -> (&mut Grid<Cell>, &[Ship]) {
        (&mut self.grid, &self.ships)
    }

    fn require_pending(&self, length: usize) -> Result<(), ValidationError> {
        if length == 0 {
            return Err(ValidationError::InvalidLength);
        }
        if !self.pending.contains(&length) {
            return Err(ValidationError::NotInFleet(length));
        }
        Ok(())
    }

    /// Start selecting the cells of a ship of `length`.
    pub fn begin_placement(&mut self, length: usize) -> Result<(), ValidationError> {
        if self.selection.is_some() {
            return Err(ValidationError::SelectionInProgress);
        }
        self.require_pending(length)?;
        self.selection = Some(Selection {
            length,
            cells: Vec::with_capacity(length),
            axis: None,
        });
        Ok(())
    }

    /// Add one cell to the open selection.
    ///
    /// Returns the finished ship when the selection reaches its length. A
    /// rejected cell leaves the selection as it was.
    pub fn add_cell(&mut self, coord: Coord) -> Result<Option<Ship>, ValidationError> {
        let selection = self.selection.as_ref().ok_or(ValidationError::OutOfOrder)?;
        selection.accepts(coord)?;
        if matches!(self.grid.get(coord), Cell::ShipPart | Cell::Blocked) {
            return Err(ValidationError::Occupied(coord));
        }
        if !selection.extends(coord) {
            return Err(ValidationError::NotAdjacent(coord));
        }

        let Some(selection) = self.selection.as_mut() else {
            return Err(ValidationError::OutOfOrder);
        };
        if selection.cells.len() == 1 {
            let first = selection.cells[0];
            selection.axis = Some(if first.row() == coord.row() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            });
        }
        selection.cells.push(coord);
        self.grid.set(coord, Cell::ShipPart);

        if selection.cells.len() < selection.length {
            return Ok(None);
        }
        let cells = core::mem::take(&mut selection.cells);
        self.selection = None;
        let ship = match Ship::from_cells(cells.clone()) {
            Ok(ship) => ship,
            Err(err) => {
                for cell in cells {
                    self.grid.set(cell, Cell::Empty);
                }
                return Err(err);
            }
        };
        self.commit(ship.clone());
        Ok(Some(ship))
    }

    /// Drop the open selection, clearing any cells it had claimed.
    pub fn cancel_placement(&mut self) -> Result<(), ValidationError> {
        let selection = self.selection.take().ok_or(ValidationError::OutOfOrder)?;
        for cell in selection.cells {
            self.grid.set(cell, Cell::Empty);
        }
        Ok(())
    }

    /// Place a whole ship at once.
    pub fn place_ship(
        &mut self,
        origin: Coord,
        length: usize,
        orientation: Orientation,
    ) -> Result<Ship, ValidationError> {
        self.require_free(length)?;
        let ship = placement::check(&self.grid, origin, length, orientation)?;
        self.commit(ship.clone());
        Ok(ship)
    }

    /// Place a whole ship, trying the fallback positions when the requested
    /// one does not fit.
    pub fn place_with_fallback(
        &mut self,
        origin: Coord,
        length: usize,
        orientation: Orientation,
    ) -> Result<Ship, ValidationError> {
        self.require_free(length)?;
        let ship = placement::find_placement(&self.grid, origin, length, orientation)
            .ok_or(ValidationError::NoValidPosition(length))?;
        self.commit(ship.clone());
        Ok(ship)
    }

    fn require_free(&self, length: usize) -> Result<(), ValidationError> {
        if self.selection.is_some() {
            return Err(ValidationError::SelectionInProgress);
        }
        self.require_pending(length)
    }

    /// Remove the ship covering `coord` and return its length to the pool.
    pub fn remove_ship(&mut self, coord: Coord) -> Result<Ship, ValidationError> {
        let index = self
            .ships
            .iter()
            .position(|ship| ship.contains(coord))
            .ok_or(ValidationError::NotFound(coord))?;
        let ship = self.ships.remove(index);
        for &cell in ship.cells() {
            self.grid.set(cell, Cell::Empty);
        }
        self.reblock();
        self.pending.push(ship.length());
        debug!(target: "torpedo::fleet", "removed {:?}", ship);
        Ok(ship)
    }

    /// Place every pending ship at random, longest first.
    ///
    /// On failure the fleet is left exactly as it was.
    pub fn auto_place<R: Rng>(&mut self, rng: &mut R) -> Result<(), ValidationError> {
        if self.selection.is_some() {
            return Err(ValidationError::SelectionInProgress);
        }
        let start = self.clone();
        let mut lengths = self.pending.clone();
        lengths.sort_unstable_by(|a, b| b.cmp(a));

        'rounds: for _ in 0..FLEET_ROUNDS {
            for &length in &lengths {
                match self.random_placement(rng, length) {
                    Some(ship) => self.commit(ship),
                    None => {
                        *self = start.clone();
                        continue 'rounds;
                    }
                }
            }
            return Ok(());
        }
        let longest = lengths.first().copied().unwrap_or(0);
        Err(ValidationError::NoValidPosition(longest))
    }

    /// A random legal position for a ship of `length`, if one is found.
    pub fn random_placement<R: Rng>(&self, rng: &mut R, length: usize) -> Option<Ship> {
        if length == 0 || length > BOARD_SIZE {
            return None;
        }
        for _ in 0..ATTEMPTS_PER_SHIP {
            let orientation = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_r, max_c) = match orientation {
                Orientation::Vertical => (BOARD_SIZE - length, BOARD_SIZE - 1),
                Orientation::Horizontal => (BOARD_SIZE - 1, BOARD_SIZE - length),
            };
            let origin = Coord::new(rng.random_range(0..=max_r), rng.random_range(0..=max_c)).ok()?;
            if let Ok(ship) = placement::check(&self.grid, origin, length, orientation) {
                return Some(ship);
            }
        }
        None
    }

    fn commit(&mut self, ship: Ship) {
        for &cell in ship.cells() {
            self.grid.set(cell, Cell::ShipPart);
        }
        if let Some(i) = self.pending.iter().position(|&l| l == ship.length()) {
            self.pending.remove(i);
        }
        debug!(target: "torpedo::fleet", "placed {:?}", ship);
        self.ships.push(ship);
        self.reblock();
    }

    /// Recompute every `Blocked` marking from the ships currently placed.
    fn reblock(&mut self) {
        for coord in Coord::all() {
            if self.grid.get(coord) == Cell::Blocked {
                self.grid.set(coord, Cell::Empty);
            }
        }
        for ship in &self.ships {
            for cell in ship.halo() {
                if self.grid.get(cell) == Cell::Empty {
                    self.grid.set(cell, Cell::Blocked);
                }
            }
        }
    }
}
