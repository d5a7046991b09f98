//! Terminal rendering of a session.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::{
    config::BOARD_SIZE,
    grid::{Cell, Grid, TargetCell},
    session::{PresentationSink, SessionEvent},
    turn::Phase,
};

fn own_char(cell: Cell) -> char {
    match cell {
        Cell::Empty => '.',
        Cell::ShipPart => 'S',
        Cell::Blocked => '-',
        Cell::Hit => 'X',
        Cell::Miss => 'o',
    }
}

fn target_char(cell: TargetCell) -> char {
    match cell {
        TargetCell::Unknown => '.',
        TargetCell::Hit => 'X',
        TargetCell::Miss => 'o',
    }
}

/// Draw `own` and `target` side by side, rows and columns numbered from 0.
pub fn render_boards(own: &Grid<Cell>, target: &Grid<TargetCell>) -> String {
    let mut out = String::new();
    let header: String = (0..BOARD_SIZE).map(|c| format!(" {}", c)).collect();
    let _ = writeln!(out, "{:<24}{}", "Your board", "Opponent");
    let _ = writeln!(out, "  {}    {}", header, header);
    for (r, (own_row, target_row)) in own.rows().zip(target.rows()).enumerate() {
        let own_cells: String = own_row.iter().map(|&c| format!(" {}", own_char(c))).collect();
        let target_cells: String = target_row
            .iter()
            .map(|&c| format!(" {}", target_char(c)))
            .collect();
        let _ = writeln!(out, "{:>2}{}  {:>2}{}", r, own_cells, r, target_cells);
    }
    out
}

/// Mirrors the session from its events and redraws after each change.
pub struct TerminalSink {
    own: Grid<Cell>,
    target: Grid<TargetCell>,
    remaining: Vec<usize>,
    status: String,
}

impl TerminalSink {
    pub fn new(fleet: &[usize]) -> Self {
        Self {
            own: Grid::default(),
            target: Grid::default(),
            remaining: fleet.to_vec(),
            status: String::from("place your ships (type `help`)"),
        }
    }

    /// The full screen: both boards and a status line.
    pub fn render(&self) -> String {
        let mut out = render_boards(&self.own, &self.target);
        if !self.remaining.is_empty() {
            let _ = writeln!(out, "to place: {:?}", self.remaining);
        }
        let _ = writeln!(out, "{}", self.status);
        out
    }

    fn status_for(event: &SessionEvent) -> Option<String> {
        let status = match event {
            SessionEvent::PhaseChanged(Phase::Ready) => "fleet submitted, waiting for opponent".into(),
            SessionEvent::TurnChanged { mine: true, .. } => "your turn: fire R C".into(),
            SessionEvent::TurnChanged { turn, .. } => format!("player {}'s turn", turn),
            SessionEvent::OwnShipSunk { length } => format!("your ship of length {} was sunk", length),
            SessionEvent::OpponentMapReceived => "opponent is ready".into(),
            SessionEvent::GameOver { won: true, .. } => "you won!".into(),
            SessionEvent::GameOver { winner, .. } => format!("you lost, player {} won", winner),
            SessionEvent::Rejected(err) => format!("rejected: {}", err),
            _ => return None,
        };
        Some(status)
    }

    fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::OwnCellChanged { coord, cell } => self.own.set(*coord, *cell),
            SessionEvent::TargetCellChanged { coord, cell } => self.target.set(*coord, *cell),
            SessionEvent::FleetChanged { remaining } => self.remaining.clone_from(remaining),
            _ => {}
        }
        if let Some(status) = Self::status_for(event) {
            self.status = status;
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

impl PresentationSink for TerminalSink {
    fn on_event(&mut self, event: &SessionEvent) {
        self.apply(event);
        // Cell changes come in bursts and are always followed by a summary event.
        if matches!(event, SessionEvent::OwnCellChanged { .. }) {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\n{}", self.render());
        let _ = stdout.flush();
    }
}
