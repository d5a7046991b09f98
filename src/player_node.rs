use std::future::Future;

use anyhow::Context;
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use tokio::sync::mpsc;

use crate::{
    common::{PlayerId, ValidationError},
    grid::Coord,
    protocol::Message,
    session::{GameSession, PresentationSink},
    ship::Orientation,
    transport::Transport,
    turn::Phase,
};

/// A local player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    BeginPlacement(usize),
    AddCell(Coord),
    CancelPlacement,
    PlaceShip {
        origin: Coord,
        length: usize,
        orientation: Orientation,
    },
    RemoveShip(Coord),
    AutoPlace,
    Fire(Coord),
}

/// Why [`PlayerNode::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The match ended with this winner.
    Finished(PlayerId),
    /// The shutdown future completed first.
    Shutdown,
    /// Local input ended and the connection closed before the match did.
    Abandoned,
}

/// Drives one [`GameSession`] over a transport.
pub struct PlayerNode {
    session: GameSession,
    transport: Box<dyn Transport>,
    rng: SmallRng,
}

impl PlayerNode {
    pub fn new(session: GameSession, transport: Box<dyn Transport>, rng: SmallRng) -> Self {
        Self {
            session,
            transport,
            rng,
        }
    }

    /// Wait for the relay's seat assignment and build the session for it.
    pub async fn join(
        mut transport: Box<dyn Transport>,
        fleet: &[usize],
        sink: Box<dyn PresentationSink>,
        rng: SmallRng,
    ) -> anyhow::Result<Self> {
        let player = loop {
            let frame = transport
                .recv()
                .await
                .context("connection closed before a seat was assigned")?;
            match Message::decode(&frame) {
                Ok(Message::Welcome(player)) => break player,
                Ok(other) => warn!(target: "torpedo::node", "expected PLAYER, got {}", other.tag()),
                Err(e) => warn!(target: "torpedo::node", "{}", e),
            }
        };
        info!(target: "torpedo::node", "joined as player {}", player);
        let session = GameSession::new(player, fleet, sink);
        Ok(Self::new(session, transport, rng))
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Run until the match is over, `shutdown` completes, or the connection
    /// is lost.
    ///
    /// Frames and commands are handled one at a time, each to completion,
    /// including sending the messages it produced.
    pub async fn run<S>(
        &mut self,
        commands: &mut mpsc::Receiver<Command>,
        shutdown: S,
    ) -> anyhow::Result<RunOutcome>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut commands_open = true;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(target: "torpedo::node", "shutting down");
                    return Ok(RunOutcome::Shutdown);
                }
                frame = self.transport.recv() => {
                    let frame = match frame {
                        Ok(frame) => frame,
                        Err(e) if e.is_closed() => return self.closed(),
                        Err(e) => return Err(e).context("lost connection to relay"),
                    };
                    debug!(target: "torpedo::node", "<- {}", frame);
                    match self.session.handle_frame(&frame) {
                        Ok(out) => self.dispatch(out).await?,
                        Err(e) => warn!(target: "torpedo::node", "dropped {:?}: {}", frame, e),
                    }
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(command) => self.execute(command).await?,
                        None => commands_open = false,
                    }
                }
            }
        }
    }

    /// The relay closes both connections once the match is decided.
    fn closed(&self) -> anyhow::Result<RunOutcome> {
        match (self.session.phase(), self.session.winner()) {
            (Phase::Finished, Some(winner)) => Ok(RunOutcome::Finished(winner)),
            _ => {
                warn!(target: "torpedo::node", "relay closed the connection mid-match");
                Ok(RunOutcome::Abandoned)
            }
        }
    }

    async fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        let session = &mut self.session;
        let result = match command {
            Command::BeginPlacement(length) => session.begin_placement(length),
            Command::AddCell(coord) => session.add_cell(coord),
            Command::CancelPlacement => session.cancel_placement(),
            Command::PlaceShip {
                origin,
                length,
                orientation,
            } => session.place_with_fallback(origin, length, orientation),
            Command::RemoveShip(coord) => session.remove_ship(coord),
            Command::AutoPlace => session.auto_place(&mut self.rng),
            Command::Fire(coord) => session.fire(coord),
        };
        match result {
            Ok(out) => self.dispatch(out).await,
            Err(err) => {
                self.reject(err);
                Ok(())
            }
        }
    }

    fn reject(&mut self, err: ValidationError) {
        debug!(target: "torpedo::node", "rejected: {}", err);
        self.session.report_rejection(err);
    }

    /// Send messages in order; a failed send ends the session.
    async fn dispatch(&mut self, out: Vec<Message>) -> anyhow::Result<()> {
        for message in out {
            let frame = message.encode();
            debug!(target: "torpedo::node", "-> {}", frame);
            self.transport
                .send(&frame)
                .await
                .with_context(|| format!("failed to send {}", message.tag()))?;
        }
        Ok(())
    }
}
