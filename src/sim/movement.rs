/// The movement engine: sliding runs of tiles and walking the player.
///
/// A move plays out in three phases. The host drives them, waiting for
/// its animations in between:
///   1. `try_move`           resolve the run, take the move token, relocate
///                           every tile in one go, let the player ride
///   2. `finish_move`        release the token, resolve the player's walk
///                           (win first, then death)
///   3. `finish_player_step` end the walk, lower the Start tile after the
///                           first step, turn a latched win into `Won`
///
/// `play_move` runs all three back to back.
///
/// Topology changes happen entirely inside phase 1, so an interrupted
/// animation can never leave the grid half-moved. While the token is
/// held every new move request is rejected, not queued.

use std::collections::HashSet;

use log::{debug, trace};

use crate::domain::direction::{Direction, Pos};
use crate::domain::player::{PendingWalk, PlayerState};
use crate::domain::rules;
use crate::domain::tile::TileType;
use crate::error::SimError;

use super::board::Board;
use super::event::GameEvent;

/// Why a move request did nothing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IgnoreReason {
    /// Another move still holds the token.
    MoveInFlight,
    /// The player is dead, has won, or is still walking.
    PlayerBusy,
    /// Nothing to drag at the origin.
    NoTile,
    /// The ring has no room, or an attribute vetoed the move.
    InvalidMove,
    /// An immovable tile with nothing to push in front of it.
    Immovable,
}

/// One tile changing slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Relocation {
    pub from: Pos,
    pub to: Pos,
    pub teleport: bool,
}

/// What a started move did to the grid.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveReport {
    /// Trailing edge of the run, i.e. the token holder.
    pub origin: Pos,
    pub direction: Direction,
    /// Leading edge first.
    pub relocations: Vec<Relocation>,
}

impl MoveReport {
    pub fn teleported(&self) -> bool {
        self.relocations.iter().any(|r| r.teleport)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Started(MoveReport),
    Ignored(IgnoreReason),
}

impl MoveOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, MoveOutcome::Started(_))
    }
}

enum Resolution {
    Run(Pos),
    Reject(IgnoreReason),
}

// ══════════════════════════════════════════════════════════════
// Drag resolution
// ══════════════════════════════════════════════════════════════

/// Axis-lock a raw drag vector (screen space, `dy` grows downwards).
/// The longer axis wins and ties go vertical. Drags whose dominant axis
/// is shorter than `min_range` are ignored, and so are non-finite drags.
pub fn resolve_drag(dx: f32, dy: f32, min_range: f32) -> Option<Direction> {
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }
    if dx.abs() > dy.abs() {
        if dx.abs() < min_range { return None; }
        Some(if dx > 0.0 { Direction::East } else { Direction::West })
    } else {
        if dy.abs() < min_range || dy == 0.0 { return None; }
        Some(if dy > 0.0 { Direction::South } else { Direction::North })
    }
}

// ══════════════════════════════════════════════════════════════
// Queries
// ══════════════════════════════════════════════════════════════

impl Board {
    /// Can the tile at `origin` start a move in `dir`?
    ///
    /// An attribute with an opinion decides on its own. Otherwise walk the
    /// whole ring and count the slots a tile could occupy (vacancies and
    /// movable tiles, the origin included); a ring with room for only one
    /// tile cannot slide.
    pub fn is_valid_move(&self, origin: Pos, dir: Direction) -> Result<bool, SimError> {
        if let Some(verdict) = self.grid.tile_at(origin)?.and_then(|t| t.attribute.move_validate()) {
            return Ok(verdict);
        }

        let mut room = 0;
        let mut at = origin;
        loop {
            at = self.grid.next_index(at, dir, true)?;
            match self.grid.slot(at) {
                None => room += 1,
                Some(t) if t.is_movable() => room += 1,
                Some(_) => {}
            }
            if at == origin { break; }
        }
        Ok(room > 1)
    }

    /// Trailing edge of the movable run containing `from`, looking back
    /// against `dir`. Does not wrap: the grid edge ends a run.
    pub fn group_start(&self, from: Pos, dir: Direction) -> Result<Pos, SimError> {
        self.grid.check(from)?;
        let back = dir.inverse();
        let mut start = from;
        while let Some(prev) = back.step_raw(start).filter(|p| self.grid.in_bounds(*p)) {
            match self.grid.slot(prev) {
                Some(t) if t.is_movable() => start = prev,
                _ => break,
            }
        }
        Ok(start)
    }

    /// Where the move would really start, following delegation off
    /// immovable tiles and back to the run's trailing edge.
    fn resolve_origin(&self, origin: Pos, dir: Direction, ignore_group_start: bool) -> Result<Resolution, SimError> {
        let mut at = origin;
        let mut ignore = ignore_group_start;

        for _ in 0..self.grid.ring_len(dir) + 3 {
            let tile = match self.grid.slot(at) {
                Some(t) => *t,
                None => return Ok(Resolution::Reject(IgnoreReason::NoTile)),
            };
            if !self.is_valid_move(at, dir)? {
                return Ok(Resolution::Reject(IgnoreReason::InvalidMove));
            }

            if !tile.is_movable() {
                let next = self.grid.next_index(at, dir, true)?;
                if self.grid.slot(next).is_none() {
                    return Ok(Resolution::Reject(IgnoreReason::Immovable));
                }
                trace!("{:?} at {at} hands the move to {next}", tile.kind);
                at = next;
                ignore = false;
                continue;
            }

            let start = if ignore { at } else { self.group_start(at, dir)? };
            if start == at {
                return Ok(Resolution::Run(at));
            }
            at = start;
            ignore = false;
        }

        Ok(Resolution::Reject(IgnoreReason::InvalidMove))
    }

    /// The run pushed from `start`: `(from, to)` pairs, trailing edge first.
    ///
    /// Walks forward from the token holder with a visited set instead of
    /// recursing. Stops at a vacancy, or when the walk comes back to a
    /// tile already in the run (a full ring rotates in place).
    fn collect_run(&self, start: Pos, dir: Direction) -> Result<Vec<(Pos, Pos)>, SimError> {
        let mut run = Vec::new();
        let mut visited = HashSet::new();
        let mut at = start;

        loop {
            visited.insert(at);
            let next = self.grid.next_index(at, dir, false)?;
            run.push((at, next));
            if self.grid.slot(next).is_none() || visited.contains(&next) {
                break;
            }
            at = next;
        }

        Ok(run)
    }
}

// ══════════════════════════════════════════════════════════════
// Phase 1: start
// ══════════════════════════════════════════════════════════════

impl Board {
    /// Same as `try_move`, from an axis-locked unit vector.
    pub fn try_move_vector(&mut self, origin: Pos, dx: i32, dy: i32) -> Result<MoveOutcome, SimError> {
        let dir = Direction::from_vector(dx, dy)?;
        self.try_move(origin, dir, false)
    }

    /// Drag the tile at `origin` one slot in `dir`.
    ///
    /// Gameplay-invalid requests come back as `Ignored` and change nothing.
    /// Errors are reserved for indices outside the grid.
    pub fn try_move(&mut self, origin: Pos, dir: Direction, ignore_group_start: bool) -> Result<MoveOutcome, SimError> {
        self.grid.check(origin)?;

        if self.token.is_some() {
            return Ok(MoveOutcome::Ignored(IgnoreReason::MoveInFlight));
        }
        if !self.player.accepts_input() {
            return Ok(MoveOutcome::Ignored(IgnoreReason::PlayerBusy));
        }

        let start = match self.resolve_origin(origin, dir, ignore_group_start)? {
            Resolution::Run(p) => p,
            Resolution::Reject(reason) => {
                trace!("move {} from {origin} ignored: {reason:?}", dir.label());
                return Ok(MoveOutcome::Ignored(reason));
            }
        };

        // ── Token ──
        self.token = Some(start);
        self.last_direction = Some(dir);
        self.moves += 1;
        debug!("move #{} {} from {start}", self.moves, dir.label());
        self.events.publish(GameEvent::MoveStarted { origin: start, direction: dir });

        // ── Relocate the run, leading edge first ──
        let run = self.collect_run(start, dir)?;
        let mut lifted = Vec::with_capacity(run.len());
        for &(from, to) in &run {
            let movable = self.grid.slot(from).map_or(false, |t| t.is_movable());
            if !movable { continue; }
            let teleport = self.grid.will_teleport(from, dir)?;
            lifted.push(Relocation { from, to, teleport });
        }
        let mut tiles = Vec::with_capacity(lifted.len());
        for r in &lifted {
            tiles.push(self.grid.take(r.from)?);
        }
        let mut relocations = Vec::with_capacity(lifted.len());
        for (r, tile) in lifted.into_iter().zip(tiles).rev() {
            if let Some(tile) = tile {
                self.grid.place(r.to, tile)?;
            }
            trace!("tile {} -> {}{}", r.from, r.to, if r.teleport { " (wrap)" } else { "" });
            self.events.publish(GameEvent::TileRelocated { from: r.from, to: r.to, teleport: r.teleport });
            relocations.push(r);
        }

        // ── Ride along ──
        let player_from = self.player.pos;
        if let Some(r) = relocations.iter().find(|r| r.from == player_from) {
            self.player.pos = r.to;
            self.events.publish(GameEvent::PlayerRodeTile { from: player_from, to: r.to });
        }

        // ── Decide the walk now, so a win can be announced early ──
        let reversed = self.grid.slot(self.player.pos).map_or(false, |t| t.is_reverse());
        let walk_dir = if reversed { dir.inverse() } else { dir };
        let wins = rules::walk_target(&self.grid, self.player.pos, walk_dir)
            .map_or(false, |to| rules::check_for_win(&self.grid, to));
        self.player.pending = Some(PendingWalk { direction: walk_dir, wins });
        if wins {
            self.events.publish(GameEvent::PlayerWillWin);
        }

        Ok(MoveOutcome::Started(MoveReport { origin: start, direction: dir, relocations }))
    }
}

// ══════════════════════════════════════════════════════════════
// Phase 2: settle
// ══════════════════════════════════════════════════════════════

impl Board {
    /// The tiles have settled: release the token and send the player
    /// walking. Does nothing if no move is in flight.
    pub fn finish_move(&mut self) -> Result<(), SimError> {
        if self.token.take().is_none() {
            return Ok(());
        }
        let walk = match self.player.pending {
            Some(w) => w,
            None => return Ok(()),
        };
        self.events.publish(GameEvent::MoveEnded { direction: walk.direction });

        let from = self.player.pos;
        match rules::walk_target(&self.grid, from, walk.direction) {
            None => self.kill_player(),
            Some(to) if walk.wins => self.begin_walk(from, to),
            Some(to) => {
                if rules::dies_on_movement(&self.grid, from, walk.direction)? {
                    self.kill_player();
                } else {
                    self.begin_walk(from, to);
                }
            }
        }
        Ok(())
    }

    fn begin_walk(&mut self, from: Pos, to: Pos) {
        self.player.pos = to;
        self.player.walking = true;
        self.events.publish(GameEvent::PlayerStepped { from, to });
    }

    fn kill_player(&mut self) {
        self.player.state = PlayerState::Dead;
        self.player.pending = None;
        self.player.walking = false;
        debug!("player died at {} (last stood at {}) on '{}'", self.player.pos, self.player.last_stable, self.level_name());
        let level = self.level_name().to_string();
        self.events.publish(GameEvent::PlayerDied { level });
    }
}

// ══════════════════════════════════════════════════════════════
// Phase 3: arrive
// ══════════════════════════════════════════════════════════════

impl Board {
    /// The player's walk animation is over.
    pub fn finish_player_step(&mut self) {
        if !self.player.walking {
            return;
        }
        self.player.walking = false;

        if !self.player.has_stepped {
            self.player.has_stepped = true;
            self.lower_start_tile();
        }

        let wins = self.player.pending.take().map_or(false, |w| w.wins);
        self.player.last_stable = self.player.pos;
        if wins {
            self.player.state = PlayerState::Won;
            debug!("level '{}' cleared in {} moves", self.level_name(), self.moves);
            let level = self.level_name().to_string();
            self.events.publish(GameEvent::PlayerWon { level });
        }
    }

    fn lower_start_tile(&mut self) {
        let at = match self.grid.find(TileType::Start) {
            Some(p) => p,
            None => return,
        };
        if let Ok(Some(tile)) = self.grid.tile_at_mut(at) {
            if tile.raised {
                tile.raised = false;
                self.events.publish(GameEvent::StartTileLowered { at });
            }
        }
    }

    /// Run all three phases without waiting in between.
    pub fn play_move(&mut self, origin: Pos, dir: Direction) -> Result<MoveOutcome, SimError> {
        let outcome = self.try_move(origin, dir, false)?;
        if outcome.is_started() {
            self.finish_move()?;
            self.finish_player_step();
        }
        Ok(outcome)
    }
}
