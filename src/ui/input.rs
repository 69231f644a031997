/// Input state tracker.
///
/// Collects terminal key events once per frame and turns the keys that
/// went down this frame into `Command`s. A key held down only fires once;
/// it must be released (or time out) before it fires again, so a drag
/// key held through a slide does not queue up a second move.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use slidepath::domain::direction::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_DRAG_N: &[KeyCode] = &[KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DRAG_W: &[KeyCode] = &[KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_DRAG_S: &[KeyCode] = &[KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_DRAG_E: &[KeyCode] = &[KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_NEXT: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N')];
pub const KEYS_PREV: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// What the player asked for this frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Cursor(Direction),
    Drag(Direction),
    Restart,
    NextLevel,
    PrevLevel,
    Quit,
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the board is advanced.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Was any of these keys freshly pressed this frame?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Commands for this frame, in a fixed priority order.
    pub fn commands(&self) -> Vec<Command> {
        let mut out = vec![];
        if self.ctrl_c_pressed() || self.any_pressed(KEYS_QUIT) {
            out.push(Command::Quit);
            return out;
        }
        if self.any_pressed(KEYS_RESTART) { out.push(Command::Restart); }
        if self.any_pressed(KEYS_NEXT) { out.push(Command::NextLevel); }
        if self.any_pressed(KEYS_PREV) { out.push(Command::PrevLevel); }

        let cursor = [
            (KeyCode::Up, Direction::North),
            (KeyCode::Right, Direction::East),
            (KeyCode::Down, Direction::South),
            (KeyCode::Left, Direction::West),
        ];
        for (code, dir) in cursor {
            if self.any_pressed(&[code]) {
                out.push(Command::Cursor(dir));
            }
        }

        let drags = [
            (KEYS_DRAG_N, Direction::North),
            (KEYS_DRAG_E, Direction::East),
            (KEYS_DRAG_S, Direction::South),
            (KEYS_DRAG_W, Direction::West),
        ];
        if let Some(&(_, dir)) = drags.iter().find(|(keys, _)| self.any_pressed(keys)) {
            out.push(Command::Drag(dir));
        }
        out
    }

    // ── Internal ──

    fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn held_key_fires_once() {
        let mut input = InputState::new();
        input.record(press(KeyCode::Char('d')));
        assert_eq!(input.commands(), vec![Command::Drag(Direction::East)]);

        input.fresh_presses.clear();
        input.record(press(KeyCode::Char('d')));
        assert!(input.commands().is_empty());
    }

    #[test]
    fn only_one_drag_per_frame() {
        let mut input = InputState::new();
        input.record(press(KeyCode::Char('a')));
        input.record(press(KeyCode::Char('w')));
        assert_eq!(input.commands(), vec![Command::Drag(Direction::North)]);
    }

    #[test]
    fn quit_wins_over_everything() {
        let mut input = InputState::new();
        input.record(press(KeyCode::Char('r')));
        input.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(input.commands(), vec![Command::Quit]);
    }

    #[test]
    fn arrows_move_the_cursor() {
        let mut input = InputState::new();
        input.record(press(KeyCode::Left));
        input.record(press(KeyCode::Char('R')));
        assert_eq!(input.commands(), vec![Command::Restart, Command::Cursor(Direction::West)]);
    }
}
