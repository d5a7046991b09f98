use proptest::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use torpedo::config::{BOARD_SIZE, DEFAULT_FLEET};
use torpedo::placement::can_place;
use torpedo::shot::{fleet_sunk, resolve};
use torpedo::{Cell, Coord, FleetManager, Orientation, Ship, ShotOutcome};

fn random_fleet(seed: u64) -> FleetManager {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut fleet = FleetManager::new(&DEFAULT_FLEET);
    fleet.auto_place(&mut rng).unwrap();
    fleet
}

/// Next cell to offer while selecting: usually a step off either end of the
/// current run, sometimes anywhere on the board.
fn next_cell(selected: &[Coord], choice: u8, row: usize, col: usize) -> Option<Coord> {
    let (Some(&first), Some(&last)) = (selected.first(), selected.last()) else {
        return Coord::new(row, col).ok();
    };
    let end = if choice & 1 == 0 { first } else { last };
    match (choice >> 1) % 5 {
        0 => end.offset(-1, 0),
        1 => end.offset(1, 0),
        2 => end.offset(0, -1),
        3 => end.offset(0, 1),
        _ => Coord::new(row, col).ok(),
    }
}

fn assert_straight_run(ship: &Ship) -> Result<(), TestCaseError> {
    for (i, &cell) in ship.cells().iter().enumerate() {
        prop_assert_eq!(ship.orientation().step(ship.origin(), i), Some(cell));
    }
    Ok(())
}

fn orientation() -> impl Strategy<Value = Orientation> {
    prop_oneof![Just(Orientation::Horizontal), Just(Orientation::Vertical)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn auto_placed_ships_never_touch(seed in any::<u64>()) {
        let fleet = random_fleet(seed);
        let ships = fleet.ships();
        prop_assert_eq!(ships.len(), DEFAULT_FLEET.len());
        for (i, a) in ships.iter().enumerate() {
            for b in &ships[i + 1..] {
                for &cell in a.cells() {
                    prop_assert!(!b.contains(cell));
                    prop_assert!(cell.neighbors().all(|n| !b.contains(n)));
                }
            }
        }
    }

    #[test]
    fn can_place_is_pure(
        seed in any::<u64>(),
        row in 0..BOARD_SIZE,
        col in 0..BOARD_SIZE,
        length in 1usize..=5,
        orient in orientation(),
    ) {
        let fleet = random_fleet(seed);
        let grid = *fleet.grid();
        let origin = Coord::new(row, col).unwrap();
        let first = can_place(&grid, origin, length, orient);
        prop_assert_eq!(can_place(&grid, origin, length, orient), first);
        prop_assert_eq!(fleet.grid(), &grid);
    }

    #[test]
    fn repeated_shot_is_idempotent(seed in any::<u64>(), row in 0..BOARD_SIZE, col in 0..BOARD_SIZE) {
        let fleet = random_fleet(seed);
        let mut grid = *fleet.grid();
        let coord = Coord::new(row, col).unwrap();
        let first = resolve(&mut grid, fleet.ships(), coord);
        prop_assert_ne!(first.outcome, ShotOutcome::AlreadyShot);
        let after = grid;
        let second = resolve(&mut grid, fleet.ships(), coord);
        prop_assert_eq!(second.outcome, ShotOutcome::AlreadyShot);
        prop_assert_eq!(grid, after);
    }

    #[test]
    fn fleet_sunk_iff_every_ship_cell_hit(seed in any::<u64>()) {
        let fleet = random_fleet(seed);
        let mut grid = *fleet.grid();
        let mut rng = SmallRng::seed_from_u64(seed ^ 0x5eed);
        let mut targets: Vec<Coord> = Coord::all().collect();
        // shoot the board in a random order
        for i in (1..targets.len()).rev() {
            targets.swap(i, rng.random_range(0..=i));
        }
        let total: usize = DEFAULT_FLEET.iter().sum();
        let mut hits = 0;
        for coord in targets {
            let report = resolve(&mut grid, fleet.ships(), coord);
            if report.outcome == ShotOutcome::Hit {
                hits += 1;
            }
            prop_assert_eq!(report.fleet_destroyed, hits == total && report.outcome == ShotOutcome::Hit);
            prop_assert_eq!(fleet_sunk(&grid, fleet.ships()), hits == total);
        }
        prop_assert!(grid.iter().all(|(_, cell)| cell.is_shot()));
        prop_assert!(grid.iter().all(|(_, cell)| cell != Cell::ShipPart));
    }

    #[test]
    fn cell_by_cell_ships_are_straight_and_never_touch(
        steps in prop::collection::vec((any::<u8>(), 0..BOARD_SIZE, 0..BOARD_SIZE), 1..300),
    ) {
        let mut fleet = FleetManager::new(&DEFAULT_FLEET);
        for (choice, row, col) in steps {
            if fleet.is_complete() {
                break;
            }
            if fleet.selection().is_none() {
                let length = fleet.pending_lengths()[0];
                fleet.begin_placement(length).unwrap();
            }
            let Some((length, selected)) = fleet.selection() else {
                unreachable!("selection was just opened");
            };
            let Some(coord) = next_cell(selected, choice, row, col) else {
                continue;
            };
            let before = fleet.clone();
            match fleet.add_cell(coord) {
                Ok(Some(ship)) => {
                    prop_assert_eq!(ship.length(), length);
                    assert_straight_run(&ship)?;
                    let others = fleet.ships().iter().filter(|other| **other != ship);
                    for other in others {
                        for &cell in ship.cells() {
                            prop_assert!(!other.contains(cell));
                            prop_assert!(cell.neighbors().all(|n| !other.contains(n)));
                        }
                    }
                    for n in ship.halo() {
                        prop_assert_eq!(fleet.grid().get(n), Cell::Blocked);
                    }
                }
                Ok(None) => {}
                Err(_) => {
                    prop_assert_eq!(&fleet, &before);
                }
            }
        }
    }
}
