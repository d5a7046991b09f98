//! Common types: player ids and the error taxonomy shared by every layer.

use core::fmt;

use thiserror::Error;

use crate::grid::Coord;
use crate::turn::Phase;

/// Relay-assigned id of one of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u8);

impl PlayerId {
    pub const ONE: PlayerId = PlayerId(1);
    pub const TWO: PlayerId = PlayerId(2);

    /// Accepts only the two seat numbers, 1 and 2.
    pub fn new(number: u8) -> Option<Self> {
        match number {
            1 | 2 => Some(PlayerId(number)),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// The other seat of the match.
    pub fn other(self) -> Self {
        if self == PlayerId::ONE {
            PlayerId::TWO
        } else {
            PlayerId::ONE
        }
    }

    /// Zero-based seat index, for per-player arrays.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A local placement or shot was illegal. Nothing was changed or sent.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ship length must be positive")]
    InvalidLength,
    #[error("no ship of length {0} is left to place")]
    NotInFleet(usize),
    #[error("another ship is already being placed")]
    SelectionInProgress,
    #[error("select a ship before choosing cells")]
    OutOfOrder,
    #[error("cell {0} is not on the axis of the ship being placed")]
    AxisMismatch(Coord),
    #[error("cell {0} does not extend the ship being placed")]
    NotAdjacent(Coord),
    #[error("cell {0} is occupied or touches another ship")]
    Occupied(Coord),
    #[error("({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("no ship at {0}")]
    NotFound(Coord),
    #[error("no valid position for a ship of length {0}")]
    NoValidPosition(usize),
    #[error("ships can no longer be changed")]
    PlacementLocked,
    #[error("the game has not started yet")]
    NotStarted,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("waiting for the result of the previous shot")]
    ShotPending,
    #[error("already fired at {0}")]
    AlreadyShot(Coord),
    #[error("the game is over")]
    GameOver,
}

/// A frame could not be decoded into a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed message {frame:?}: {reason}")]
pub struct MalformedMessage {
    pub frame: String,
    pub reason: String,
}

impl MalformedMessage {
    pub(crate) fn new(frame: &str, reason: impl Into<String>) -> Self {
        Self {
            frame: frame.to_string(),
            reason: reason.into(),
        }
    }
}

/// An incoming message was dropped. The connection stays usable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error(transparent)]
    Malformed(#[from] MalformedMessage),
    #[error("{tag} is not accepted while {phase:?}")]
    OutOfPhase { tag: &'static str, phase: Phase },
    #[error("{tag} arrived while this player holds the turn")]
    OutOfTurn { tag: &'static str },
    #[error("opponent fired twice at {0}")]
    DuplicateShot(Coord),
    #[error("shot result for {0} does not answer any shot")]
    UnsolicitedResult(Coord),
    #[error("relay addressed player {0}")]
    WrongPlayer(PlayerId),
    #[error("{0} is only sent by clients")]
    ClientOnly(&'static str),
}
