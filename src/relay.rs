//! Two-seat relay that pairs players and sequences their turns.
//!
//! The relay forwards `MAP` and `SHOT` to the opponent, broadcasts
//! `SHOT_RESULT` and game over, and is the only party that announces `TURN`.
//! It reads each forwarded map only to notice the hit that sinks the last
//! ship, after which no further turn is announced.

use anyhow::Context;
use log::{debug, info, warn};
use tokio::net::{TcpListener, ToSocketAddrs};

use crate::common::PlayerId;
use crate::grid::{Cell, Coord};
use crate::protocol::Message;
use crate::shot::Impact;
use crate::transport::{tcp::TcpTransport, Transport};

/// How a relayed match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Finished(PlayerId),
    /// The given player's connection closed before the match was decided.
    Disconnected(PlayerId),
}

pub struct Relay {
    seats: [Box<dyn Transport>; 2],
    ready: [bool; 2],
    turn: Option<PlayerId>,
    /// Shot forwarded to the defender and not yet answered.
    in_flight: Option<(PlayerId, Coord)>,
    last_shooter: Option<PlayerId>,
    /// Ship cells of each player not yet reported hit, from their `MAP`.
    afloat: [Option<Vec<Coord>>; 2],
    /// Set once a result sinks the last ship; only game over is expected then.
    decided: bool,
}

impl Relay {
    /// Seat `first` as player 1 and `second` as player 2.
    pub fn new(first: Box<dyn Transport>, second: Box<dyn Transport>) -> Self {
        Self {
            seats: [first, second],
            ready: [false; 2],
            turn: None,
            in_flight: None,
            last_shooter: None,
            afloat: [None, None],
            decided: false,
        }
    }

    /// Run the match to completion. Both connections are dropped on return.
    pub async fn run(mut self) -> anyhow::Result<RelayOutcome> {
        for player in [PlayerId::ONE, PlayerId::TWO] {
            self.send_to(player, &Message::Welcome(player)).await?;
        }
        info!(target: "torpedo::relay", "both seats assigned");

        loop {
            let (from, frame) = {
                let [first, second] = &mut self.seats;
                tokio::select! {
                    frame = first.recv() => (PlayerId::ONE, frame),
                    frame = second.recv() => (PlayerId::TWO, frame),
                }
            };
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) if e.is_closed() => {
                    warn!(target: "torpedo::relay", "player {} disconnected", from);
                    return Ok(RelayOutcome::Disconnected(from));
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("receiving from player {}", from))
                }
            };
            debug!(target: "torpedo::relay", "{} -> {}", from, frame);
            if let Some(winner) = self.route(from, &frame).await? {
                info!(target: "torpedo::relay", "player {} won", winner);
                return Ok(RelayOutcome::Finished(winner));
            }
        }
    }

    /// Handle one frame from `from`. Returns the winner once the match ends.
    async fn route(&mut self, from: PlayerId, frame: &str) -> anyhow::Result<Option<PlayerId>> {
        let message = match Message::decode(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(target: "torpedo::relay", "dropping frame from {}: {}", from, e);
                return Ok(None);
            }
        };
        match message {
            Message::Ready => {
                self.ready[from.index()] = true;
                if self.ready == [true, true] && self.turn.is_none() {
                    self.announce_turn(PlayerId::ONE).await?;
                }
            }
            Message::Map(_) => {
                if self.turn.is_some() {
                    warn!(target: "torpedo::relay", "dropping late map from {}", from);
                } else {
                    if let Message::Map(grid) = &message {
                        let cells = grid
                            .iter()
                            .filter(|&(_, cell)| cell == Cell::ShipPart)
                            .map(|(coord, _)| coord)
                            .collect();
                        self.afloat[from.index()] = Some(cells);
                    }
                    self.send_to(from.other(), &message).await?;
                }
            }
            Message::Shot(coord) => {
                if self.decided || self.turn != Some(from) || self.in_flight.is_some() {
                    warn!(target: "torpedo::relay", "dropping out-of-turn shot from {}", from);
                } else {
                    self.in_flight = Some((from, coord));
                    self.send_to(from.other(), &message).await?;
                }
            }
            Message::ShotResult { coord, impact } => {
                let Some((shooter, target)) = self.in_flight else {
                    warn!(target: "torpedo::relay", "dropping unsolicited result from {}", from);
                    return Ok(None);
                };
                if from != shooter.other() || coord != target {
                    warn!(target: "torpedo::relay", "dropping mismatched result from {}", from);
                    return Ok(None);
                }
                self.in_flight = None;
                self.last_shooter = Some(shooter);
                self.broadcast(&message).await?;
                if impact == Impact::Hit && self.sinks_last_ship(from, coord) {
                    info!(target: "torpedo::relay", "player {} has no ships left", from);
                    self.decided = true;
                } else {
                    self.announce_turn(from).await?;
                }
            }
            Message::GameOver { winner } => {
                let Some(winner) = winner.or(self.last_shooter) else {
                    warn!(target: "torpedo::relay", "dropping game over before any shot");
                    return Ok(None);
                };
                let message = Message::GameOver {
                    winner: Some(winner),
                };
                self.broadcast(&message).await?;
                return Ok(Some(winner));
            }
            Message::Welcome(_) | Message::Turn(_) => {
                warn!(target: "torpedo::relay", "dropping {} from client {}", message.tag(), from);
            }
        }
        Ok(None)
    }

    /// Record a hit on `defender` and report whether its fleet is now gone.
    /// A player whose map was never seen is never considered sunk.
    fn sinks_last_ship(&mut self, defender: PlayerId, coord: Coord) -> bool {
        match &mut self.afloat[defender.index()] {
            Some(cells) => {
                cells.retain(|&c| c != coord);
                cells.is_empty()
            }
            None => false,
        }
    }

    async fn announce_turn(&mut self, player: PlayerId) -> anyhow::Result<()> {
        self.turn = Some(player);
        self.broadcast(&Message::Turn(player)).await
    }

    async fn broadcast(&mut self, message: &Message) -> anyhow::Result<()> {
        for player in [PlayerId::ONE, PlayerId::TWO] {
            self.send_to(player, message).await?;
        }
        Ok(())
    }

    async fn send_to(&mut self, player: PlayerId, message: &Message) -> anyhow::Result<()> {
        self.seats[player.index()]
            .send(&message.encode())
            .await
            .with_context(|| format!("sending {} to player {}", message.tag(), player))
    }
}

/// Accept exactly two TCP clients on `bind` and relay one match between them.
pub async fn serve_tcp<A: ToSocketAddrs>(bind: A) -> anyhow::Result<RelayOutcome> {
    let listener = TcpListener::bind(bind).await.context("binding relay socket")?;
    serve_listener(listener).await
}

/// Like [`serve_tcp`], on an already bound listener.
pub async fn serve_listener(listener: TcpListener) -> anyhow::Result<RelayOutcome> {
    info!(target: "torpedo::relay", "listening on {}", listener.local_addr()?);
    let mut seats = Vec::with_capacity(2);
    while seats.len() < 2 {
        let (stream, addr) = listener.accept().await?;
        info!(target: "torpedo::relay", "player {} connected from {}", seats.len() + 1, addr);
        seats.push(Box::new(TcpTransport::new(stream)) as Box<dyn Transport>);
    }
    let second = seats.pop().context("second seat missing")?;
    let first = seats.pop().context("first seat missing")?;
    Relay::new(first, second).run().await
}
