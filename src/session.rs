//! One player's view of one match.
//!
//! `GameSession` owns the fleet, the opponent view and the turn state. It
//! performs no I/O: local actions and incoming frames return the messages
//! that must be sent, in order, and every state change is reported to an
//! injected [`PresentationSink`].

use log::{debug, info, warn};
use rand::Rng;

use crate::common::{PlayerId, ProtocolError, ValidationError};
use crate::fleet::FleetManager;
use crate::grid::{Cell, Coord, Grid, TargetCell};
use crate::protocol::Message;
use crate::ship::Orientation;
use crate::shot::{self, Impact};
use crate::turn::{Phase, TurnController};

/// A state change worth showing to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    OwnCellChanged { coord: Coord, cell: Cell },
    TargetCellChanged { coord: Coord, cell: TargetCell },
    /// Placed ships or the lengths left to place changed.
    FleetChanged { remaining: Vec<usize> },
    PhaseChanged(Phase),
    TurnChanged { turn: PlayerId, mine: bool },
    OwnShipSunk { length: usize },
    OpponentMapReceived,
    GameOver { winner: PlayerId, won: bool },
    Rejected(ValidationError),
}

/// Receives session events for rendering. Must not feed back into the session.
pub trait PresentationSink: Send {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F> PresentationSink for F
where
    F: FnMut(&SessionEvent) + Send,
{
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

/// Writes every event through the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink;

impl PresentationSink for LogSink {
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::OwnCellChanged { .. } | SessionEvent::TargetCellChanged { .. } => {
                debug!(target: "torpedo::events", "{:?}", event)
            }
            SessionEvent::Rejected(err) => warn!(target: "torpedo::events", "rejected: {}", err),
            _ => info!(target: "torpedo::events", "{:?}", event),
        }
    }
}

/// Point-in-time copy of everything a presentation layer may draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub player: PlayerId,
    pub phase: Phase,
    pub current_turn: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub own: Grid<Cell>,
    pub target: Grid<TargetCell>,
    pub remaining: Vec<usize>,
    pub opponent_map: Option<Grid<Cell>>,
}

pub struct GameSession {
    fleet: FleetManager,
    target: Grid<TargetCell>,
    turn: TurnController,
    pending_shot: Option<Coord>,
    last_shooter: Option<PlayerId>,
    opponent_map: Option<Grid<Cell>>,
    sink: Box<dyn PresentationSink>,
}

impl GameSession {
    /// Start a match in `Placement` with `fleet` lengths to place.
    pub fn new(player: PlayerId, fleet: &[usize], sink: Box<dyn PresentationSink>) -> Self {
        Self {
            fleet: FleetManager::new(fleet),
            target: Grid::default(),
            turn: TurnController::new(player),
            pending_shot: None,
            last_shooter: None,
            opponent_map: None,
            sink,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.turn.player()
    }

    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        self.turn.current_turn()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.turn.winner()
    }

    pub fn fleet(&self) -> &FleetManager {
        &self.fleet
    }

    pub fn target(&self) -> &Grid<TargetCell> {
        &self.target
    }

    pub fn opponent_map(&self) -> Option<&Grid<Cell>> {
        self.opponent_map.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            player: self.player(),
            phase: self.phase(),
            current_turn: self.current_turn(),
            winner: self.winner(),
            own: *self.fleet.grid(),
            target: self.target,
            remaining: self.fleet.pending_lengths().to_vec(),
            opponent_map: self.opponent_map,
        }
    }

    /// Report a rejected local action to the player.
    pub fn report_rejection(&mut self, err: ValidationError) {
        self.sink.on_event(&SessionEvent::Rejected(err));
    }

    fn emit(&mut self, event: SessionEvent) {
        self.sink.on_event(&event);
    }

    // ---- placement ----

    pub fn begin_placement(&mut self, length: usize) -> Result<Vec<Message>, ValidationError> {
        self.edit_fleet(|fleet| fleet.begin_placement(length))
    }

    pub fn add_cell(&mut self, coord: Coord) -> Result<Vec<Message>, ValidationError> {
        self.edit_fleet(|fleet| fleet.add_cell(coord).map(drop))
    }

    pub fn cancel_placement(&mut self) -> Result<Vec<Message>, ValidationError> {
        self.edit_fleet(FleetManager::cancel_placement)
    }

    /// Place a whole ship exactly where requested.
    pub fn place_ship(
        &mut self,
        origin: Coord,
        length: usize,
        orientation: Orientation,
    ) -> Result<Vec<Message>, ValidationError> {
        self.edit_fleet(|fleet| fleet.place_ship(origin, length, orientation).map(drop))
    }

    /// Place a whole ship, falling back to nearby positions that fit.
    pub fn place_with_fallback(
        &mut self,
        origin: Coord,
        length: usize,
        orientation: Orientation,
    ) -> Result<Vec<Message>, ValidationError> {
        self.edit_fleet(|fleet| fleet.place_with_fallback(origin, length, orientation).map(drop))
    }

    pub fn remove_ship(&mut self, coord: Coord) -> Result<Vec<Message>, ValidationError> {
        self.edit_fleet(|fleet| fleet.remove_ship(coord).map(drop))
    }

    pub fn auto_place<R: Rng>(&mut self, rng: &mut R) -> Result<Vec<Message>, ValidationError> {
        self.edit_fleet(|fleet| fleet.auto_place(rng))
    }

    /// Apply a fleet edit, report the cells it changed, and submit the fleet
    /// once it is complete.
    fn edit_fleet<F>(&mut self, edit: F) -> Result<Vec<Message>, ValidationError>
    where
        F: FnOnce(&mut FleetManager) -> Result<(), ValidationError>,
    {
        if self.phase() != Phase::Placement {
            return Err(ValidationError::PlacementLocked);
        }
        let before = *self.fleet.grid();
        let pending_before = self.fleet.pending_lengths().to_vec();
        edit(&mut self.fleet)?;

        let after = *self.fleet.grid();
        let changed: Vec<Coord> = after.diff(&before).collect();
        for &coord in &changed {
            self.emit(SessionEvent::OwnCellChanged {
                coord,
                cell: after.get(coord),
            });
        }
        if !changed.is_empty() || self.fleet.pending_lengths() != pending_before.as_slice() {
            let remaining = self.fleet.pending_lengths().to_vec();
            self.emit(SessionEvent::FleetChanged { remaining });
        }
        if !self.fleet.is_complete() {
            return Ok(Vec::new());
        }
        self.turn.fleet_completed()?;
        info!(target: "torpedo::session", "player {} fleet complete", self.player());
        self.emit(SessionEvent::PhaseChanged(Phase::Ready));
        Ok(vec![Message::Map(after), Message::Ready])
    }

    // ---- shooting ----

    /// Fire at the opponent's board. Only legal shots produce a message.
    pub fn fire(&mut self, coord: Coord) -> Result<Vec<Message>, ValidationError> {
        self.turn.authorize_shot()?;
        if self.pending_shot.is_some() {
            return Err(ValidationError::ShotPending);
        }
        if self.target.get(coord) != TargetCell::Unknown {
            return Err(ValidationError::AlreadyShot(coord));
        }
        self.pending_shot = Some(coord);
        debug!(target: "torpedo::session", "player {} fires at {}", self.player(), coord);
        Ok(vec![Message::Shot(coord)])
    }

    // ---- incoming ----

    /// Decode and apply one incoming frame.
    ///
    /// A malformed or out-of-phase frame is rejected without touching any state.
    pub fn handle_frame(&mut self, frame: &str) -> Result<Vec<Message>, ProtocolError> {
        let message = Message::decode(frame)?;
        self.handle_message(message)
    }

    pub fn handle_message(&mut self, message: Message) -> Result<Vec<Message>, ProtocolError> {
        match message {
            Message::Welcome(player) if player == self.player() => Ok(Vec::new()),
            Message::Welcome(player) => Err(ProtocolError::WrongPlayer(player)),
            Message::Ready => Err(ProtocolError::ClientOnly("READY")),
            Message::Map(grid) => self.on_map(grid),
            Message::Turn(turn) => self.on_turn(turn),
            Message::Shot(coord) => self.on_shot(coord),
            Message::ShotResult { coord, impact } => self.on_shot_result(coord, impact),
            Message::GameOver { winner } => self.on_game_over(winner),
        }
    }

    fn on_map(&mut self, grid: Grid<Cell>) -> Result<Vec<Message>, ProtocolError> {
        let phase = self.phase();
        if matches!(phase, Phase::Active | Phase::Finished) {
            return Err(ProtocolError::OutOfPhase { tag: "MAP", phase });
        }
        self.opponent_map = Some(grid);
        self.emit(SessionEvent::OpponentMapReceived);
        Ok(Vec::new())
    }

    fn on_turn(&mut self, turn: PlayerId) -> Result<Vec<Message>, ProtocolError> {
        if self.phase() == Phase::Finished {
            debug!(target: "torpedo::session", "ignoring turn announcement after game over");
            return Ok(Vec::new());
        }
        let was = self.phase();
        self.turn.announce_turn(turn)?;
        if let Some(coord) = self.pending_shot.take() {
            warn!(target: "torpedo::session", "turn changed before the result for {} arrived", coord);
        }
        if was != Phase::Active {
            self.emit(SessionEvent::PhaseChanged(Phase::Active));
        }
        let mine = turn == self.player();
        self.emit(SessionEvent::TurnChanged { turn, mine });
        Ok(Vec::new())
    }

    fn on_shot(&mut self, coord: Coord) -> Result<Vec<Message>, ProtocolError> {
        if self.phase() != Phase::Active {
            return Err(ProtocolError::OutOfPhase {
                tag: "SHOT",
                phase: self.phase(),
            });
        }
        let Some(shooter) = self.current_turn().filter(|&t| t != self.player()) else {
            return Err(ProtocolError::OutOfTurn { tag: "SHOT" });
        };

        let (grid, ships) = self.fleet.battle_parts();
        let report = shot::resolve(grid, ships, coord);
        let Some(impact) = report.outcome.impact() else {
            return Err(ProtocolError::DuplicateShot(coord));
        };
        self.last_shooter = Some(shooter);
        let cell = self.fleet.grid().get(coord);
        self.emit(SessionEvent::OwnCellChanged { coord, cell });
        if let Some(ship) = &report.sunk {
            let length = ship.length();
            self.emit(SessionEvent::OwnShipSunk { length });
        }

        let mut out = vec![Message::ShotResult { coord, impact }];
        if report.fleet_destroyed {
            self.turn.finish(shooter)?;
            info!(target: "torpedo::session", "player {} lost: fleet destroyed", self.player());
            self.emit(SessionEvent::PhaseChanged(Phase::Finished));
            self.emit(SessionEvent::GameOver {
                winner: shooter,
                won: false,
            });
            out.push(Message::GameOver {
                winner: Some(shooter),
            });
        }
        Ok(out)
    }

    fn on_shot_result(
        &mut self,
        coord: Coord,
        impact: Impact,
    ) -> Result<Vec<Message>, ProtocolError> {
        if self.phase() == Phase::Placement {
            return Err(ProtocolError::OutOfPhase {
                tag: "SHOT_RESULT",
                phase: Phase::Placement,
            });
        }
        if self.pending_shot == Some(coord) {
            self.pending_shot = None;
            self.last_shooter = Some(self.player());
            let cell = TargetCell::from(impact);
            self.target.set(coord, cell);
            self.emit(SessionEvent::TargetCellChanged { coord, cell });
            return Ok(Vec::new());
        }

        // The relay echoes results to the defender, who resolved the shot already.
        let own = self.fleet.grid().get(coord);
        if own.is_shot() {
            if own != Cell::from(impact) {
                warn!(
                    target: "torpedo::session",
                    "relay reports {:?} at {} but own board has {:?}",
                    impact,
                    coord,
                    own
                );
            }
            return Ok(Vec::new());
        }
        Err(ProtocolError::UnsolicitedResult(coord))
    }

    fn on_game_over(&mut self, winner: Option<PlayerId>) -> Result<Vec<Message>, ProtocolError> {
        if self.phase() == Phase::Finished {
            return Ok(Vec::new());
        }
        // The legacy frame names no winner; only a resolved shot can end a match.
        let winner = winner
            .or(self.last_shooter)
            .or(self.current_turn())
            .ok_or(ProtocolError::OutOfPhase {
                tag: "GAME_OVER",
                phase: self.phase(),
            })?;
        self.turn.finish(winner)?;
        let won = winner == self.player();
        info!(
            target: "torpedo::session",
            "player {} {}",
            self.player(),
            if won { "won" } else { "lost" }
        );
        self.emit(SessionEvent::PhaseChanged(Phase::Finished));
        self.emit(SessionEvent::GameOver { winner, won });
        Ok(Vec::new())
    }

    /// Shots resolved on the own board so far.
    pub fn shots_received(&self) -> usize {
        self.fleet.grid().iter().filter(|(_, cell)| cell.is_shot()).count()
    }

    /// Shots this player has had resolved against the opponent.
    pub fn shots_fired(&self) -> usize {
        self.target
            .iter()
            .filter(|(_, cell)| *cell != TargetCell::Unknown)
            .count()
    }
}
