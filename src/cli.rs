//! Line commands typed by a terminal player.

use anyhow::{anyhow, bail, Context};

use crate::{grid::Coord, player_node::Command, ship::Orientation};

pub const HELP: &str = "\
commands (rows and columns are 0-9):
  begin L          start selecting a ship of length L
  cell R C         add a cell to the ship being selected
  cancel           drop the current selection
  place R C h|v L  place a whole ship, trying nearby positions if blocked
  remove R C       take back the ship covering a cell
  auto             place the remaining ships randomly
  fire R C         shoot at the opponent's board
  help             show this text
  quit             leave the game";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Help,
    Quit,
}

fn number(word: Option<&str>, what: &str) -> anyhow::Result<usize> {
    let word = word.ok_or_else(|| anyhow!("missing {}", what))?;
    word.parse()
        .with_context(|| format!("{} must be a number, got {:?}", what, word))
}

fn coord(words: &mut std::str::SplitWhitespace<'_>) -> anyhow::Result<Coord> {
    let row = number(words.next(), "row")?;
    let col = number(words.next(), "column")?;
    Ok(Coord::new(row, col)?)
}

fn orientation(word: Option<&str>) -> anyhow::Result<Orientation> {
    match word.map(str::to_ascii_lowercase).as_deref() {
        Some("h") | Some("horizontal") => Ok(Orientation::Horizontal),
        Some("v") | Some("vertical") => Ok(Orientation::Vertical),
        Some(other) => bail!("orientation must be h or v, got {:?}", other),
        None => bail!("missing orientation"),
    }
}

/// Parse one input line. Blank lines are not commands.
pub fn parse_line(line: &str) -> anyhow::Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let input = match verb.to_ascii_lowercase().as_str() {
        "begin" => Input::Command(Command::BeginPlacement(number(words.next(), "length")?)),
        "cell" => Input::Command(Command::AddCell(coord(&mut words)?)),
        "cancel" => Input::Command(Command::CancelPlacement),
        "place" => {
            let origin = coord(&mut words)?;
            let orientation = orientation(words.next())?;
            let length = number(words.next(), "length")?;
            Input::Command(Command::PlaceShip {
                origin,
                length,
                orientation,
            })
        }
        "remove" => Input::Command(Command::RemoveShip(coord(&mut words)?)),
        "auto" => Input::Command(Command::AutoPlace),
        "fire" => Input::Command(Command::Fire(coord(&mut words)?)),
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => bail!("unknown command {:?}, type `help`", other),
    };
    if let Some(extra) = words.next() {
        bail!("unexpected {:?} after {}", extra, verb);
    }
    Ok(Some(input))
}
