//! Match phases and turn ownership for one player's view of a match.
//!
//! Turn ownership is never computed locally: the relay announces it and the
//! controller only records it.

use crate::common::{PlayerId, ProtocolError, ValidationError};

/// Phase of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Ships are being placed.
    Placement,
    /// Own fleet submitted, waiting for the first turn announcement.
    Ready,
    /// Shots are being exchanged.
    Active,
    /// A fleet was destroyed.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnController {
    player: PlayerId,
    phase: Phase,
    current_turn: Option<PlayerId>,
    winner: Option<PlayerId>,
}

impl TurnController {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            phase: Phase::Placement,
            current_turn: None,
            winner: None,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        self.current_turn
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn is_my_turn(&self) -> bool {
        self.phase == Phase::Active && self.current_turn == Some(self.player)
    }

    /// `Placement -> Ready` once the local fleet is complete.
    pub fn fleet_completed(&mut self) -> Result<(), ValidationError> {
        if self.phase != Phase::Placement {
            return Err(ValidationError::PlacementLocked);
        }
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Record a `TURN` announcement. `Ready` and `Active` move to `Active`.
    pub fn announce_turn(&mut self, turn: PlayerId) -> Result<(), ProtocolError> {
        match self.phase {
            Phase::Ready | Phase::Active => {
                self.phase = Phase::Active;
                self.current_turn = Some(turn);
                Ok(())
            }
            phase => Err(ProtocolError::OutOfPhase { tag: "TURN", phase }),
        }
    }

    /// Whether this player may fire right now.
    pub fn authorize_shot(&self) -> Result<(), ValidationError> {
        match self.phase {
            Phase::Placement | Phase::Ready => Err(ValidationError::NotStarted),
            Phase::Finished => Err(ValidationError::GameOver),
            Phase::Active if self.current_turn == Some(self.player) => Ok(()),
            Phase::Active => Err(ValidationError::NotYourTurn),
        }
    }

    /// `Active -> Finished` with the given winner.
    pub fn finish(&mut self, winner: PlayerId) -> Result<(), ProtocolError> {
        if self.phase != Phase::Active {
            return Err(ProtocolError::OutOfPhase {
                tag: "GAME_OVER",
                phase: self.phase,
            });
        }
        self.phase = Phase::Finished;
        self.winner = Some(winner);
        Ok(())
    }
}
