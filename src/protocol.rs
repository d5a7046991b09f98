//! Text wire protocol exchanged between clients and the relay.
//!
//! Every frame is a tag, optionally followed by `:` and a payload:
//!
//! | frame                         | sender             |
//! |-------------------------------|--------------------|
//! | `PLAYER:<n>`                  | relay              |
//! | `READY`                       | client             |
//! | `MAP:<json rows>`             | client, forwarded  |
//! | `TURN:<n>`                    | relay              |
//! | `SHOT:<row>,<col>`            | client, forwarded  |
//! | `SHOT_RESULT:<r>,<c>,HIT\|MISS` | client, broadcast |
//! | `GAME_OVER:<n>` / `Game Over!`| client, broadcast  |

use core::fmt;
use core::str::FromStr;

use serde::Deserialize;

use crate::common::{MalformedMessage, PlayerId};
use crate::config::BOARD_SIZE;
use crate::grid::{Cell, Coord, Grid};
use crate::shot::Impact;

/// Legacy game-over frame without a winner.
pub const LEGACY_GAME_OVER: &str = "Game Over!";

/// Messages exchanged between clients and the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Seat assignment, first frame on every connection.
    Welcome(PlayerId),
    /// Sender finished placing its fleet.
    Ready,
    /// Sender's own board as placed.
    Map(Grid<Cell>),
    /// The given player holds the turn.
    Turn(PlayerId),
    /// Fire at a cell of the recipient's board.
    Shot(Coord),
    /// Outcome of the shot at `coord`.
    ShotResult { coord: Coord, impact: Impact },
    /// The match ended. `None` only for the legacy frame.
    GameOver { winner: Option<PlayerId> },
}

/// `MAP` payloads: a bare row array, or the object form some clients send.
#[derive(Deserialize)]
#[serde(untagged)]
enum MapPayload {
    Rows(Vec<String>),
    Tagged {
        #[serde(rename = "PlayerNumber")]
        #[allow(dead_code)]
        player_number: Option<u8>,
        #[serde(rename = "Map")]
        map: Vec<String>,
    },
}

impl Message {
    /// Wire tag of the message.
    pub fn tag(&self) -> &'static str {
        match self {
            Message::Welcome(_) => "PLAYER",
            Message::Ready => "READY",
            Message::Map(_) => "MAP",
            Message::Turn(_) => "TURN",
            Message::Shot(_) => "SHOT",
            Message::ShotResult { .. } => "SHOT_RESULT",
            Message::GameOver { .. } => "GAME_OVER",
        }
    }

    /// Encode into a single text frame.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode a text frame. Nothing outside the returned value is touched.
    pub fn decode(frame: &str) -> Result<Self, MalformedMessage> {
        if frame == "READY" {
            return Ok(Message::Ready);
        }
        if frame == LEGACY_GAME_OVER {
            return Ok(Message::GameOver { winner: None });
        }
        let (tag, payload) = frame
            .split_once(':')
            .ok_or_else(|| MalformedMessage::new(frame, "unknown message"))?;
        match tag {
            "PLAYER" => Ok(Message::Welcome(parse_player(frame, payload)?)),
            "TURN" => Ok(Message::Turn(parse_player(frame, payload)?)),
            "GAME_OVER" => Ok(Message::GameOver {
                winner: Some(parse_player(frame, payload)?),
            }),
            "MAP" => Ok(Message::Map(parse_map(frame, payload)?)),
            "SHOT" => {
                let fields: Vec<&str> = payload.split(',').collect();
                let [row, col] = fields[..] else {
                    return Err(MalformedMessage::new(frame, "expected <row>,<col>"));
                };
                Ok(Message::Shot(parse_coord(frame, row, col)?))
            }
            "SHOT_RESULT" => {
                let fields: Vec<&str> = payload.split(',').collect();
                let [row, col, impact] = fields[..] else {
                    return Err(MalformedMessage::new(frame, "expected <row>,<col>,<HIT|MISS>"));
                };
                let impact = match impact {
                    "HIT" => Impact::Hit,
                    "MISS" => Impact::Miss,
                    _ => return Err(MalformedMessage::new(frame, "outcome must be HIT or MISS")),
                };
                Ok(Message::ShotResult {
                    coord: parse_coord(frame, row, col)?,
                    impact,
                })
            }
            _ => Err(MalformedMessage::new(frame, format!("unknown tag {:?}", tag))),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Welcome(player) => write!(f, "PLAYER:{}", player),
            Message::Ready => f.write_str("READY"),
            Message::Map(grid) => write!(f, "MAP:{}", encode_map(grid)),
            Message::Turn(player) => write!(f, "TURN:{}", player),
            Message::Shot(coord) => write!(f, "SHOT:{},{}", coord.row(), coord.col()),
            Message::ShotResult { coord, impact } => {
                let impact = match impact {
                    Impact::Hit => "HIT",
                    Impact::Miss => "MISS",
                };
                write!(f, "SHOT_RESULT:{},{},{}", coord.row(), coord.col(), impact)
            }
            Message::GameOver {
                winner: Some(winner),
            } => write!(f, "GAME_OVER:{}", winner),
            Message::GameOver { winner: None } => f.write_str(LEGACY_GAME_OVER),
        }
    }
}

impl FromStr for Message {
    type Err = MalformedMessage;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        Message::decode(frame)
    }
}

fn parse_player(frame: &str, payload: &str) -> Result<PlayerId, MalformedMessage> {
    payload
        .parse::<u8>()
        .ok()
        .and_then(PlayerId::new)
        .ok_or_else(|| MalformedMessage::new(frame, "player id must be 1 or 2"))
}

fn parse_coord(frame: &str, row: &str, col: &str) -> Result<Coord, MalformedMessage> {
    let (Ok(row), Ok(col)) = (row.parse::<usize>(), col.parse::<usize>()) else {
        return Err(MalformedMessage::new(frame, "coordinates must be integers"));
    };
    Coord::new(row, col).map_err(|e| MalformedMessage::new(frame, e.to_string()))
}

/// Character of a cell in a `MAP` row.
fn map_char(cell: Cell) -> char {
    match cell {
        Cell::Empty | Cell::Miss => 'E',
        Cell::ShipPart | Cell::Hit => '1',
        Cell::Blocked => 'X',
    }
}

fn encode_map(grid: &Grid<Cell>) -> String {
    let rows: Vec<String> = grid
        .rows()
        .map(|row| row.iter().copied().map(map_char).collect())
        .collect();
    serde_json::Value::from(rows).to_string()
}

fn parse_map(frame: &str, payload: &str) -> Result<Grid<Cell>, MalformedMessage> {
    let rows = match serde_json::from_str::<MapPayload>(payload) {
        Ok(MapPayload::Rows(rows)) | Ok(MapPayload::Tagged { map: rows, .. }) => rows,
        Err(e) => return Err(MalformedMessage::new(frame, format!("invalid map json: {}", e))),
    };
    if rows.len() != BOARD_SIZE {
        return Err(MalformedMessage::new(
            frame,
            format!("map has {} rows, expected {}", rows.len(), BOARD_SIZE),
        ));
    }
    let mut grid = Grid::default();
    for (r, row) in rows.iter().enumerate() {
        let chars: Vec<char> = row.chars().collect();
        if chars.len() != BOARD_SIZE {
            return Err(MalformedMessage::new(
                frame,
                format!("map row {} has {} cells, expected {}", r, chars.len(), BOARD_SIZE),
            ));
        }
        for (c, ch) in chars.into_iter().enumerate() {
            let cell = match ch {
                '0' | 'E' => Cell::Empty,
                '1' => Cell::ShipPart,
                'X' => Cell::Blocked,
                other => {
                    return Err(MalformedMessage::new(
                        frame,
                        format!("unknown map cell {:?}", other),
                    ))
                }
            };
            let coord = Coord::new(r, c).map_err(|e| MalformedMessage::new(frame, e.to_string()))?;
            grid.set(coord, cell);
        }
    }
    Ok(grid)
}
