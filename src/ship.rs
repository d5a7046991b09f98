//! Ship geometry: orientation, cells and sunk detection.

use core::fmt;

use crate::common::ValidationError;
use crate::grid::{Cell, Coord, Grid};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// The `i`-th cell from `origin` along this axis, if it is on the board.
    pub fn step(self, origin: Coord, i: usize) -> Option<Coord> {
        let i = isize::try_from(i).ok()?;
        match self {
            Orientation::Horizontal => origin.offset(0, i),
            Orientation::Vertical => origin.offset(i, 0),
        }
    }
}

/// A fully placed ship. Cells are ordered from the top-left end.
#[derive(Clone, PartialEq, Eq)]
pub struct Ship {
    orientation: Orientation,
    cells: Vec<Coord>,
}

impl Ship {
    /// Lay out a ship of `length` cells from `origin` along `orientation`.
    pub fn new(
        origin: Coord,
        length: usize,
        orientation: Orientation,
    ) -> Result<Self, ValidationError> {
        if length == 0 {
            return Err(ValidationError::InvalidLength);
        }
        let mut cells = Vec::with_capacity(length);
        for i in 0..length {
            let cell = orientation.step(origin, i).ok_or_else(|| {
                let (row, col) = match orientation {
                    Orientation::Horizontal => (origin.row(), origin.col() + i),
                    Orientation::Vertical => (origin.row() + i, origin.col()),
                };
                ValidationError::OutOfBounds { row, col }
            })?;
            cells.push(cell);
        }
        // A single cell has no axis; report it as horizontal.
        let orientation = if length == 1 {
            Orientation::Horizontal
        } else {
            orientation
        };
        Ok(Ship { orientation, cells })
    }

    /// Build a ship from cells selected one by one.
    ///
    /// The cells must form one contiguous run on a single row or column.
    pub fn from_cells(mut cells: Vec<Coord>) -> Result<Self, ValidationError> {
        let first = *cells.first().ok_or(ValidationError::InvalidLength)?;
        cells.sort();
        let orientation = if cells.iter().all(|c| c.row() == first.row()) {
            Orientation::Horizontal
        } else if cells.iter().all(|c| c.col() == first.col()) {
            Orientation::Vertical
        } else {
            let stray = cells
                .iter()
                .copied()
                .find(|c| c.row() != first.row())
                .unwrap_or(first);
            return Err(ValidationError::AxisMismatch(stray));
        };
        if let Some(gap) = cells
            .windows(2)
            .find(|pair| !pair[0].is_orthogonal_neighbor(pair[1]))
        {
            return Err(ValidationError::NotAdjacent(gap[1]));
        }
        Ok(Ship { orientation, cells })
    }

    pub fn length(&self) -> usize {
        self.cells.len()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn origin(&self) -> Coord {
        self.cells[0]
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }

    /// Cells touching the ship (8-neighbourhood) that are not part of it.
    pub fn halo(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells
            .iter()
            .flat_map(|cell| cell.neighbors())
            .filter(move |n| !self.contains(*n))
    }

    /// Sunk once every cell is `Hit` on the owner's board.
    pub fn is_sunk(&self, grid: &Grid<Cell>) -> bool {
        self.cells.iter().all(|&cell| grid.get(cell) == Cell::Hit)
    }
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ship {{ length: {}, origin: {}, orientation: {:?} }}",
            self.length(),
            self.origin(),
            self.orientation,
        )
    }
}
