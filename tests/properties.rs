use slidepath::domain::direction::{Direction, Pos};
use slidepath::domain::player::PlayerState;
use slidepath::sim::board::Board;
use slidepath::sim::event::GameEvent;
use slidepath::sim::level::load_level_str;
use slidepath::sim::movement::{IgnoreReason, MoveOutcome, Relocation};

fn board(text: &str) -> Board {
    load_level_str(text, "prop").unwrap()
}

fn home_x(b: &Board, x: usize, y: usize) -> Option<usize> {
    b.tile_at(Pos::new(x, y)).unwrap().map(|t| t.home.x)
}

#[test]
fn run_keeps_its_order_across_the_wrap() {
    let mut b = board("# Coherence\nS0 . .  .  .\n.  . I1 L0 T0\nE0 . .  .  .\n");
    let report = match b.try_move(Pos::new(2, 1), Direction::East, false).unwrap() {
        MoveOutcome::Started(r) => r,
        other => panic!("move ignored: {other:?}"),
    };

    assert_eq!(home_x(&b, 3, 1), Some(2));
    assert_eq!(home_x(&b, 4, 1), Some(3));
    assert_eq!(home_x(&b, 0, 1), Some(4));
    assert_eq!(home_x(&b, 2, 1), None);

    let wrapped: Vec<&Relocation> = report.relocations.iter().filter(|r| r.teleport).collect();
    assert_eq!(wrapped.len(), 1);
    assert_eq!((wrapped[0].from, wrapped[0].to), (Pos::new(4, 1), Pos::new(0, 1)));
    assert_eq!(report.relocations[0].from, Pos::new(4, 1), "leading edge first");
}

#[test]
fn second_request_in_flight_changes_nothing() {
    let mut b = board("# Token\nS2 I0 .\nI0 .  I0\nE0 .  .\n");
    assert!(b.try_move(Pos::new(1, 0), Direction::South, false).unwrap().is_started());
    let grid = b.grid().clone();
    let token = b.move_token();
    let events = b.drain_events();

    for (x, y) in [(2, 1), (1, 1), (0, 1)] {
        for dir in Direction::ALL {
            assert_eq!(
                b.try_move(Pos::new(x, y), dir, false).unwrap(),
                MoveOutcome::Ignored(IgnoreReason::MoveInFlight)
            );
        }
    }
    assert_eq!(b.grid(), &grid);
    assert_eq!(b.move_token(), token);
    assert_eq!(b.moves(), 1);
    assert!(b.drain_events().is_empty());
    assert!(!events.is_empty());

    b.finish_move().unwrap();
    assert!(!b.is_moving());
}

#[test]
fn lone_tile_cannot_move() {
    let mut b = board("# Lonely\nS0 # I0 # E0\n");
    for dir in Direction::ALL {
        assert!(!b.is_valid_move(Pos::new(2, 0), dir).unwrap());
    }
    assert_eq!(
        b.try_move(Pos::new(2, 0), Direction::East, false).unwrap(),
        MoveOutcome::Ignored(IgnoreReason::InvalidMove)
    );
}

#[test]
fn pairs_can_move() {
    let b = board("# Pair\nS0 I0 I0 E0\n");
    assert!(b.is_valid_move(Pos::new(1, 0), Direction::East).unwrap());
    let b = board("# Gap\nS0 I0 .\n");
    assert!(b.is_valid_move(Pos::new(1, 0), Direction::West).unwrap());
}

#[test]
fn win_beats_death_on_the_same_step() {
    // The start only opens north, but the walk east lands on the end.
    let mut b = board("# Lucky\nS0 E0\nI0 .\n");
    b.play_move(Pos::new(0, 1), Direction::East).unwrap();
    assert_eq!(b.player().state, PlayerState::Won);
    let events = b.drain_events();
    assert!(events.iter().any(|e| matches!(e, GameEvent::PlayerWon { .. })));
    assert!(!events.iter().any(|e| matches!(e, GameEvent::PlayerDied { .. })));
}

#[test]
fn straight_then_end() {
    let mut b = board("# Example\nS2 I0 .\nI0 .  .\nE0 .  .\n");

    b.play_move(Pos::new(1, 0), Direction::South).unwrap();
    assert_eq!(b.player().pos, Pos::new(0, 1));
    assert_eq!(b.player().state, PlayerState::Alive);

    b.play_move(Pos::new(1, 1), Direction::South).unwrap();
    assert_eq!(b.player().pos, Pos::new(0, 2));
    assert_eq!(b.player().state, PlayerState::Won);
}

#[test]
fn single_row_wraps_west() {
    // Three columns in one row: the wrap lands on x = 2.
    let mut b = board("# Strip\nI0 . .\n");
    assert!(b.grid().will_teleport(Pos::new(0, 0), Direction::West).unwrap());

    let report = match b.try_move(Pos::new(0, 0), Direction::West, false).unwrap() {
        MoveOutcome::Started(r) => r,
        other => panic!("move ignored: {other:?}"),
    };
    assert_eq!(
        report.relocations,
        vec![Relocation { from: Pos::new(0, 0), to: Pos::new(2, 0), teleport: true }]
    );
    // No start tile: the player spawned on the tile and rode it.
    assert_eq!(b.player().pos, Pos::new(2, 0));
    assert!(b.drain_events().contains(&GameEvent::PlayerRodeTile { from: Pos::new(0, 0), to: Pos::new(2, 0) }));
}

#[test]
fn death_blocks_input_until_restart() {
    let mut b = board("# Wall\nS0 I1\nI0 .\n");
    b.play_move(Pos::new(0, 1), Direction::East).unwrap();
    assert_eq!(b.player().state, PlayerState::Dead);
    assert_eq!(b.player().pos, Pos::new(0, 0), "a failed step does not move the player");
    assert_eq!(
        b.try_move(Pos::new(1, 1), Direction::West, false).unwrap(),
        MoveOutcome::Ignored(IgnoreReason::PlayerBusy)
    );

    b.drain_events();
    b.restart();
    assert_eq!(b.player().state, PlayerState::Alive);
    assert_eq!(home_x(&b, 0, 1), Some(0));
    assert_eq!(b.moves(), 0);
    assert_eq!(b.drain_events(), vec![GameEvent::LevelRestarted { moves: 1 }]);
}

#[test]
fn out_of_range_origin_is_an_error() {
    let mut b = board("# Tiny\nS0 E0\n");
    assert!(b.try_move(Pos::new(2, 0), Direction::East, false).is_err());
    assert!(b.try_move_vector(Pos::new(0, 0), 1, 1).is_err());
}
