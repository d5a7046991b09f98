pub mod cli;
pub mod common;
pub mod config;
pub mod fleet;
pub mod grid;
mod logging;
pub mod placement;
pub mod player_node;
pub mod protocol;
pub mod relay;
pub mod session;
pub mod ship;
pub mod shot;
pub mod transport;
pub mod turn;
pub mod ui;

pub use common::*;
pub use fleet::FleetManager;
pub use grid::{Cell, Coord, Grid, TargetCell};
pub use logging::init_logging;
pub use player_node::{Command, PlayerNode, RunOutcome};
pub use protocol::Message;
pub use relay::{Relay, RelayOutcome};
pub use session::{GameSession, LogSink, PresentationSink, SessionEvent, SessionSnapshot};
pub use ship::{Orientation, Ship};
pub use shot::{Impact, ShotOutcome, ShotReport};
pub use transport::{Transport, TransportError};
pub use turn::{Phase, TurnController};
