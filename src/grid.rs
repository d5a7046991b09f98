//! Fixed-size board grids and the coordinates used to address them.
//!
//! A `Grid<C>` is a `BOARD_SIZE × BOARD_SIZE` array of cell values addressed
//! by [`Coord`]. Coordinates can only be built inside the board, so
//! grid access never goes out of bounds.

use core::fmt;

use crate::common::ValidationError;
use crate::config::BOARD_SIZE;

/// A zero-based position on the board, always within `[0, BOARD_SIZE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    row: usize,
    col: usize,
}

impl Coord {
    /// Build a coordinate, failing with `OutOfBounds` outside the board.
    pub fn new(row: usize, col: usize) -> Result<Self, ValidationError> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Ok(Self { row, col })
        } else {
            Err(ValidationError::OutOfBounds { row, col })
        }
    }

    pub fn row(self) -> usize {
        self.row
    }

    pub fn col(self) -> usize {
        self.col
    }

    /// Shift by a signed offset, `None` if the result leaves the board.
    pub fn offset(self, dr: isize, dc: isize) -> Option<Self> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        Coord::new(row, col).ok()
    }

    /// The up to eight surrounding cells, clipped at the board edges.
    pub fn neighbors(self) -> impl Iterator<Item = Coord> {
        (-1isize..=1)
            .flat_map(|dr| (-1isize..=1).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .filter_map(move |(dr, dc)| self.offset(dr, dc))
    }

    /// True if the two cells share an edge.
    pub fn is_orthogonal_neighbor(self, other: Coord) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// Every coordinate of the board in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord { row, col }))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// State of one cell of a player's own board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    ShipPart,
    /// Adjacency buffer around a placed ship; only meaningful before play starts.
    Blocked,
    Hit,
    Miss,
}

impl Cell {
    /// True once a shot has landed on this cell.
    pub fn is_shot(self) -> bool {
        matches!(self, Cell::Hit | Cell::Miss)
    }
}

/// State of one cell of the opponent-view board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetCell {
    #[default]
    Unknown,
    Hit,
    Miss,
}

/// A square board of cell values.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Grid<C> {
    cells: [[C; BOARD_SIZE]; BOARD_SIZE],
}

impl<C: Copy + Default> Default for Grid<C> {
    fn default() -> Self {
        Self::filled(C::default())
    }
}

impl<C: Copy> Grid<C> {
    /// Grid with every cell set to `value`.
    pub fn filled(value: C) -> Self {
        Self {
            cells: [[value; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn get(&self, coord: Coord) -> C {
        self.cells[coord.row][coord.col]
    }

    pub fn set(&mut self, coord: Coord, value: C) {
        self.cells[coord.row][coord.col] = value;
    }

    /// All cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, C)> + '_ {
        Coord::all().map(move |coord| (coord, self.get(coord)))
    }

    /// Rows as slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[C; BOARD_SIZE]> {
        self.cells.iter()
    }

    /// Coordinates whose value differs between `self` and `other`.
    pub fn diff<'a>(&'a self, other: &'a Grid<C>) -> impl Iterator<Item = Coord> + 'a
    where
        C: PartialEq,
    {
        Coord::all().filter(move |&coord| self.get(coord) != other.get(coord))
    }
}

impl<C: fmt::Debug> fmt::Debug for Grid<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.cells.iter()).finish()
    }
}
