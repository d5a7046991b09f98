use torpedo::protocol::LEGACY_GAME_OVER;
use torpedo::{Cell, Coord, FleetManager, Grid, Impact, Message, Orientation, PlayerId};

fn at(row: usize, col: usize) -> Coord {
    Coord::new(row, col).unwrap()
}

#[test]
fn test_encode_simple_frames() {
    assert_eq!(Message::Ready.encode(), "READY");
    assert_eq!(Message::Turn(PlayerId::TWO).encode(), "TURN:2");
    assert_eq!(Message::Welcome(PlayerId::ONE).encode(), "PLAYER:1");
    assert_eq!(Message::Shot(at(3, 4)).encode(), "SHOT:3,4");
    assert_eq!(
        Message::ShotResult {
            coord: at(3, 4),
            impact: Impact::Hit
        }
        .encode(),
        "SHOT_RESULT:3,4,HIT"
    );
    assert_eq!(
        Message::GameOver {
            winner: Some(PlayerId::TWO)
        }
        .encode(),
        "GAME_OVER:2"
    );
    assert_eq!(Message::GameOver { winner: None }.encode(), LEGACY_GAME_OVER);
}

#[test]
fn test_decode_simple_frames() {
    assert_eq!(Message::decode("READY").unwrap(), Message::Ready);
    assert_eq!(Message::decode("TURN:1").unwrap(), Message::Turn(PlayerId::ONE));
    assert_eq!(Message::decode("SHOT:0,9").unwrap(), Message::Shot(at(0, 9)));
    assert_eq!(
        Message::decode("SHOT_RESULT:9,0,MISS").unwrap(),
        Message::ShotResult {
            coord: at(9, 0),
            impact: Impact::Miss
        }
    );
    assert_eq!(
        Message::decode("Game Over!").unwrap(),
        Message::GameOver { winner: None }
    );
    let parsed: Message = "GAME_OVER:1".parse().unwrap();
    assert_eq!(
        parsed,
        Message::GameOver {
            winner: Some(PlayerId::ONE)
        }
    );
}

#[test]
fn test_malformed_frames_are_rejected() {
    for frame in [
        "",
        "HELLO",
        "READY:1",
        "TURN:3",
        "TURN:0",
        "TURN:x",
        "PLAYER:",
        "SHOT:1",
        "SHOT:1,2,3",
        "SHOT:10,0",
        "SHOT:-1,0",
        "SHOT:a,b",
        "SHOT_RESULT:1,2",
        "SHOT_RESULT:1,2,SUNK",
        "MAP:not json",
        "MAP:[]",
        "shot:1,2",
    ] {
        let err = Message::decode(frame).unwrap_err();
        assert_eq!(err.frame, frame);
    }
}

#[test]
fn test_map_encoding_uses_e_1_and_x() {
    let mut fleet = FleetManager::new(&[2]);
    fleet.place_ship(at(0, 0), 2, Orientation::Horizontal).unwrap();
    let frame = Message::Map(*fleet.grid()).encode();
    let rows = frame.strip_prefix("MAP:").unwrap();
    let rows: Vec<String> = serde_json::from_str(rows).unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0], "11XEEEEEEE");
    assert_eq!(rows[1], "XXXEEEEEEE");
    assert_eq!(rows[9], "EEEEEEEEEE");
}

#[test]
fn test_map_round_trip_keeps_layout() {
    let mut fleet = FleetManager::new(&[3, 2]);
    fleet.place_ship(at(4, 4), 3, Orientation::Vertical).unwrap();
    fleet.place_ship(at(9, 0), 2, Orientation::Horizontal).unwrap();
    let message = Message::Map(*fleet.grid());
    assert_eq!(Message::decode(&message.encode()).unwrap(), message);
}

#[test]
fn test_map_accepts_object_form_and_zero_cells() {
    let mut rows = vec!["0000000000".to_string(); 10];
    rows[2] = "0011100000".to_string();
    let payload = serde_json::json!({ "PlayerNumber": 2, "Map": rows });
    let Message::Map(grid) = Message::decode(&format!("MAP:{}", payload)).unwrap() else {
        panic!("expected a map");
    };
    assert_eq!(grid.get(at(2, 2)), Cell::ShipPart);
    assert_eq!(grid.get(at(2, 4)), Cell::ShipPart);
    assert_eq!(grid.get(at(2, 5)), Cell::Empty);
    assert_eq!(grid.iter().filter(|(_, c)| *c == Cell::ShipPart).count(), 3);
}

#[test]
fn test_map_with_short_row_is_malformed() {
    let mut rows = vec!["EEEEEEEEEE".to_string(); 10];
    rows[3] = "EEEEEEEEE".to_string();
    let frame = format!("MAP:{}", serde_json::to_string(&rows).unwrap());
    let err = Message::decode(&frame).unwrap_err();
    assert!(err.reason.contains("row 3"), "{}", err.reason);
}

#[test]
fn test_map_with_unknown_cell_is_malformed() {
    let mut rows = vec!["EEEEEEEEEE".to_string(); 10];
    rows[0] = "EEEEEEEEE?".to_string();
    let frame = format!("MAP:{}", serde_json::to_string(&rows).unwrap());
    assert!(Message::decode(&frame).is_err());

    let rows = vec!["EEEEEEEEEE".to_string(); 9];
    let frame = format!("MAP:{}", serde_json::to_string(&rows).unwrap());
    assert!(Message::decode(&frame).is_err());
}

#[test]
fn test_hits_encode_as_ship_parts() {
    let mut grid: Grid<Cell> = Grid::default();
    grid.set(at(0, 0), Cell::Hit);
    grid.set(at(0, 1), Cell::Miss);
    let Message::Map(decoded) = Message::decode(&Message::Map(grid).encode()).unwrap() else {
        panic!("expected a map");
    };
    assert_eq!(decoded.get(at(0, 0)), Cell::ShipPart);
    assert_eq!(decoded.get(at(0, 1)), Cell::Empty);
}

#[test]
fn test_tags() {
    assert_eq!(Message::Ready.tag(), "READY");
    assert_eq!(Message::Shot(at(0, 0)).tag(), "SHOT");
    assert_eq!(Message::GameOver { winner: None }.tag(), "GAME_OVER");
}
