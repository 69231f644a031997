/// Board: the complete state of one running level.
///
/// ## Ownership
///
/// The board owns the grid, the player, the move token and the event
/// bus. The move token is a plain field here, so exactly one move can be
/// in flight per board and nothing global is involved.
///
/// All topology mutations go through the movement engine
/// (`sim::movement`) or `restart()`. Reads are free.

use log::{debug, warn};

use crate::domain::direction::{Direction, Pos};
use crate::domain::grid::Grid;
use crate::domain::player::Player;
use crate::domain::tile::{Tile, TileType};
use crate::error::SimError;

use super::event::{EventBus, GameEvent, Subscriber};

#[derive(Debug)]
pub struct Board {
    pub(crate) grid: Grid,
    pub(crate) player: Player,
    /// Trailing edge of the run currently sliding, if any.
    pub(crate) token: Option<Pos>,
    pub(crate) last_direction: Option<Direction>,
    pub(crate) moves: u32,
    level: String,
    pub(crate) events: EventBus,
}

// ── Construction ──

impl Board {
    /// Wrap a freshly authored grid. A level without a Start tile is still
    /// playable for testing; the player then spawns at (0, 0).
    pub fn new(grid: Grid, level: impl Into<String>) -> Self {
        let level = level.into();

        let starts = grid.count(TileType::Start);
        let ends = grid.count(TileType::End);
        if starts != 1 {
            warn!("level '{level}': expected one Start tile, found {starts}");
        }
        if ends != 1 {
            warn!("level '{level}': expected one End tile, found {ends}");
        }

        let spawn = grid.find(TileType::Start).unwrap_or_default();
        debug!("level '{level}': {}x{} grid, spawn {spawn}", grid.width(), grid.height());

        Board {
            grid,
            player: Player::new(spawn),
            token: None,
            last_direction: None,
            moves: 0,
            level,
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        self.events.subscribe(subscriber);
    }
}

// ── Queries ──

impl Board {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn level_name(&self) -> &str {
        &self.level
    }

    pub fn tile_at(&self, pos: Pos) -> Result<Option<&Tile>, SimError> {
        self.grid.tile_at(pos)
    }

    /// The trailing edge of the run currently sliding.
    pub fn move_token(&self) -> Option<Pos> {
        self.token
    }

    pub fn is_moving(&self) -> bool {
        self.token.is_some()
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    /// Moves started since load or the last restart.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Can the tile at `pos` be picked up for dragging?
    /// Start and End stay put and vacancies have nothing to grab.
    pub fn can_select(&self, pos: Pos) -> bool {
        match self.grid.tile_at(pos) {
            Ok(Some(t)) => !matches!(t.kind, TileType::Start | TileType::End),
            _ => false,
        }
    }

    /// Events raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }
}

// ── Restart ──

impl Board {
    /// Put every tile back at its home slot, raise them all and bring the
    /// player back to spawn. Any move in flight is dropped.
    pub fn restart(&mut self) {
        let mut tiles: Vec<Tile> = Vec::new();
        for pos in self.grid.positions().collect::<Vec<_>>() {
            if let Ok(Some(tile)) = self.grid.take(pos) {
                tiles.push(tile);
            }
        }
        for mut tile in tiles {
            tile.raised = true;
            let home = tile.home;
            if let Err(e) = self.grid.place(home, tile) {
                warn!("level '{}': tile home {home} is off the grid: {e}", self.level);
            }
        }

        let moves = self.moves;
        self.player.reset();
        self.token = None;
        self.last_direction = None;
        self.moves = 0;
        debug!("level '{}': restarted after {moves} moves", self.level);
        self.events.publish(GameEvent::LevelRestarted { moves });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;

    pub(crate) fn board_from(rows: &[&str]) -> Board {
        Board::new(grid_from(rows), "test")
    }

    #[test]
    fn spawns_on_start() {
        let b = board_from(&[
            "...",
            ".S.",
            "..E",
        ]);
        assert_eq!(b.player().pos, Pos::new(1, 1));
        assert!(!b.is_moving());
        assert_eq!(b.moves(), 0);
    }

    #[test]
    fn missing_start_spawns_at_origin() {
        let b = board_from(&["IIE"]);
        assert_eq!(b.player().pos, Pos::new(0, 0));
    }

    #[test]
    fn start_and_end_cannot_be_selected() {
        let b = board_from(&["SIE."]);
        assert!(!b.can_select(Pos::new(0, 0)));
        assert!(b.can_select(Pos::new(1, 0)));
        assert!(!b.can_select(Pos::new(2, 0)));
        assert!(!b.can_select(Pos::new(3, 0)));
        assert!(!b.can_select(Pos::new(9, 0)));
    }

    #[test]
    fn restart_puts_tiles_home() {
        let mut b = board_from(&["SI.E"]);
        let tile = b.grid.take(Pos::new(1, 0)).unwrap().unwrap();
        b.grid.place(Pos::new(2, 0), tile).unwrap();
        b.grid.tile_at_mut(Pos::new(0, 0)).unwrap().unwrap().raised = false;
        b.moves = 4;

        b.restart();

        assert_eq!(b.tile_at(Pos::new(1, 0)).unwrap().map(|t| t.kind), Some(TileType::Straight));
        assert!(b.tile_at(Pos::new(2, 0)).unwrap().is_none());
        assert!(b.tile_at(Pos::new(0, 0)).unwrap().unwrap().raised);
        assert_eq!(b.moves(), 0);
        assert_eq!(b.drain_events(), vec![GameEvent::LevelRestarted { moves: 4 }]);
    }
}
