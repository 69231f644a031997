/// Play session: the host side of the three-phase move protocol.
///
/// The board resolves a move instantly; the session waits a number of
/// ticks for each visual phase before calling the next board phase.
///
///   Idle ── drag ──▶ Sliding ── finish_move ──▶ Walking ── finish_player_step ──▶ Idle
///                                   │                              │
///                                   ▼                              ▼
///                                 Dying ── restart ──▶ Idle      Winning ── next level
///
/// Level switching and restart are allowed in every phase.

use std::rc::Rc;

use log::{info, warn};

use slidepath::config::TimingConfig;
use slidepath::domain::direction::{Direction, Pos};
use slidepath::domain::player::PlayerState;
use slidepath::error::SimError;
use slidepath::sim::board::Board;
use slidepath::sim::event::GameEvent;
use slidepath::sim::level::LevelDef;
use slidepath::sim::movement::{MoveOutcome, Relocation};

use super::input::Command;
use super::sound::{SoundCues, SoundEngine};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Sliding,
    Walking,
    Dying,
    Winning,
    /// Every level is cleared.
    Complete,
}

pub struct Session {
    levels: Vec<LevelDef>,
    current: usize,
    pub board: Board,
    pub cursor: Pos,
    pub phase: Phase,
    /// Ticks left in the current phase.
    pub timer: u32,
    /// Total ticks the current phase started with, for animation progress.
    pub phase_len: u32,
    /// Tiles moved by the move in flight, for the slide animation.
    pub sliding: Vec<Relocation>,
    pub message: String,
    timing: TimingConfig,
    sound: Option<Rc<SoundEngine>>,
}

impl Session {
    /// `None` when there is no level to play.
    pub fn new(levels: Vec<LevelDef>, timing: TimingConfig, sound: Option<Rc<SoundEngine>>) -> Option<Self> {
        let board = levels.first()?.board();
        let mut session = Session {
            levels,
            current: 0,
            board,
            cursor: Pos::default(),
            phase: Phase::Idle,
            timer: 0,
            phase_len: 0,
            sliding: vec![],
            message: String::new(),
            timing,
            sound,
        };
        session.load(0);
        Some(session)
    }

    pub fn level_index(&self) -> usize {
        self.current
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level_title(&self) -> &str {
        self.levels.get(self.current).map_or("", |d| d.name.as_str())
    }

    /// Fraction of the current phase already shown, `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.phase_len == 0 {
            return 1.0;
        }
        1.0 - self.timer as f32 / self.phase_len as f32
    }

    fn load(&mut self, index: usize) {
        let Some(def) = self.levels.get(index) else { return };
        let mut board = def.board();
        if let Some(engine) = &self.sound {
            board.subscribe(Box::new(SoundCues(Rc::clone(engine))));
        }
        info!("loading level {} '{}'", index + 1, def.name);
        self.message = def.name.clone();
        self.cursor = board.player().pos;
        self.board = board;
        self.current = index;
        self.sliding.clear();
        self.enter(Phase::Idle, 0);
    }

    fn enter(&mut self, phase: Phase, ticks: u32) {
        self.phase = phase;
        self.timer = ticks;
        self.phase_len = ticks;
    }

    // ── Commands ──

    /// Apply one command. Returns true when the player asked to quit.
    pub fn handle(&mut self, cmd: Command) -> Result<bool, SimError> {
        match cmd {
            Command::Quit => return Ok(true),
            Command::Restart => {
                self.board.restart();
                self.cursor = self.board.player().pos;
                self.sliding.clear();
                self.enter(Phase::Idle, 0);
            }
            Command::NextLevel => {
                if self.current + 1 < self.levels.len() {
                    self.load(self.current + 1);
                }
            }
            Command::PrevLevel => {
                if self.current > 0 {
                    self.load(self.current - 1);
                }
            }
            Command::Cursor(dir) => self.move_cursor(dir),
            Command::Drag(dir) => self.drag(dir)?,
        }
        Ok(false)
    }

    fn move_cursor(&mut self, dir: Direction) {
        let grid = self.board.grid();
        let (dx, dy) = dir.delta();
        let w = grid.width() as i64;
        let h = grid.height() as i64;
        let x = (self.cursor.x as i64 + dx as i64).rem_euclid(w);
        let y = (self.cursor.y as i64 + dy as i64).rem_euclid(h);
        self.cursor = Pos::new(x as usize, y as usize);
    }

    fn drag(&mut self, dir: Direction) -> Result<(), SimError> {
        if self.phase != Phase::Idle || !self.board.can_select(self.cursor) {
            return Ok(());
        }
        match self.board.try_move(self.cursor, dir, false)? {
            MoveOutcome::Started(report) => {
                if let Some(r) = report.relocations.iter().find(|r| r.from == self.cursor) {
                    self.cursor = r.to;
                }
                let ticks = if report.teleported() {
                    self.timing.teleport_ticks
                } else {
                    self.timing.slide_ticks
                };
                self.sliding = report.relocations;
                self.enter(Phase::Sliding, ticks);
            }
            MoveOutcome::Ignored(reason) => {
                self.message = format!("can't move {}: {reason:?}", dir.label());
            }
        }
        Ok(())
    }

    // ── Ticks ──

    /// Advance one host tick.
    pub fn tick(&mut self) -> Result<(), SimError> {
        if self.timer > 0 {
            self.timer -= 1;
            if self.timer > 0 {
                return Ok(());
            }
        }

        match self.phase {
            Phase::Idle | Phase::Complete => {}
            Phase::Sliding => {
                self.sliding.clear();
                self.board.finish_move()?;
                if self.board.player().state == PlayerState::Dead {
                    self.enter(Phase::Dying, self.timing.death_ticks);
                } else if self.board.player().walking {
                    self.enter(Phase::Walking, self.timing.step_ticks);
                } else {
                    self.enter(Phase::Idle, 0);
                }
            }
            Phase::Walking => {
                self.board.finish_player_step();
                if self.board.player().state == PlayerState::Won {
                    self.enter(Phase::Winning, self.timing.win_ticks);
                } else {
                    self.enter(Phase::Idle, 0);
                }
            }
            Phase::Dying => {
                self.board.restart();
                self.cursor = self.board.player().pos;
                self.enter(Phase::Idle, 0);
            }
            Phase::Winning => {
                if self.current + 1 < self.levels.len() {
                    self.load(self.current + 1);
                } else {
                    self.message = "All levels cleared".to_string();
                    self.enter(Phase::Complete, 0);
                }
            }
        }
        Ok(())
    }

    /// Drain board events into the status line.
    pub fn collect_events(&mut self) {
        for event in self.board.drain_events() {
            match event {
                GameEvent::PlayerWillWin => self.message = "Almost there...".to_string(),
                GameEvent::PlayerWon { level } => {
                    self.message = format!("Cleared in {} moves", self.board.moves());
                    info!("level '{level}' cleared");
                }
                GameEvent::PlayerDied { level } => {
                    self.message = "Fell off the path".to_string();
                    warn!("player died on '{level}'");
                }
                GameEvent::LevelRestarted { .. } => self.message = "Restarted".to_string(),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidepath::sim::level::embedded_levels;

    fn instant() -> TimingConfig {
        TimingConfig {
            tick_rate_ms: 1,
            slide_ticks: 2,
            teleport_ticks: 3,
            step_ticks: 1,
            death_ticks: 1,
            win_ticks: 1,
        }
    }

    fn session() -> Session {
        Session::new(embedded_levels(), instant(), None).unwrap()
    }

    /// Drag from `at`, then tick until the move has fully played out.
    fn drag_and_settle(s: &mut Session, at: Pos, dir: Direction) {
        s.cursor = at;
        s.handle(Command::Drag(dir)).unwrap();
        for _ in 0..20 {
            if !matches!(s.phase, Phase::Sliding | Phase::Walking | Phase::Dying) {
                break;
            }
            s.tick().unwrap();
            s.collect_events();
        }
    }

    #[test]
    fn empty_level_list_has_no_session() {
        assert!(Session::new(vec![], instant(), None).is_none());
    }

    #[test]
    fn slide_waits_before_walking() {
        let mut s = session();
        s.cursor = Pos::new(1, 1);
        s.handle(Command::Drag(Direction::South)).unwrap();
        assert_eq!(s.phase, Phase::Sliding);
        assert_eq!(s.cursor, Pos::new(1, 2), "cursor follows the tile");
        assert_eq!(s.timer, 2);

        s.tick().unwrap();
        assert_eq!(s.phase, Phase::Sliding);
        s.tick().unwrap();
        assert_eq!(s.phase, Phase::Walking);
        s.tick().unwrap();
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(s.board.player().pos, Pos::new(0, 1));
    }

    #[test]
    fn drags_are_ignored_mid_move() {
        let mut s = session();
        s.cursor = Pos::new(1, 1);
        s.handle(Command::Drag(Direction::South)).unwrap();
        s.handle(Command::Drag(Direction::North)).unwrap();
        assert_eq!(s.board.moves(), 1);
    }

    #[test]
    fn clearing_a_level_loads_the_next() {
        let mut s = session();
        drag_and_settle(&mut s, Pos::new(1, 1), Direction::South);
        drag_and_settle(&mut s, Pos::new(1, 2), Direction::South);
        assert_eq!(s.phase, Phase::Winning);
        s.tick().unwrap();
        assert_eq!(s.level_index(), 1);
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(s.level_title(), "The Bend");
    }

    #[test]
    fn wrap_uses_teleport_timing() {
        let mut s = session();
        drag_and_settle(&mut s, Pos::new(1, 1), Direction::South);
        s.cursor = Pos::new(1, 2);
        s.handle(Command::Drag(Direction::South)).unwrap();
        assert_eq!(s.timer, 3);
        assert!(s.sliding.iter().any(|r| r.teleport));
    }

    #[test]
    fn cursor_wraps_and_levels_step() {
        let mut s = session();
        s.handle(Command::Cursor(Direction::West)).unwrap();
        assert_eq!(s.cursor, Pos::new(2, 0));
        s.handle(Command::PrevLevel).unwrap();
        assert_eq!(s.level_index(), 0);
        s.handle(Command::NextLevel).unwrap();
        s.handle(Command::NextLevel).unwrap();
        assert_eq!(s.level_index(), 2);
        assert!(s.handle(Command::Quit).unwrap());
    }
}
