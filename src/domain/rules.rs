/// Player survival and win rules: truth-table driven.
///
/// Pure functions over the grid, no side effects.
/// These answer "what happens if the player walks here" without
/// moving anybody.
///
/// ## Walk Truth Table
///
/// Evaluated top to bottom; the first matching row decides.
/// ┌──────────────────────────────────────┬─────────┐
/// │ Condition                            │ Result  │
/// ├──────────────────────────────────────┼─────────┤
/// │ raw destination negative             │ DIES    │
/// │ raw destination past the far edge    │ DIES    │
/// │ no tile under the player             │ DIES    │
/// │ no tile at the destination           │ DIES    │
/// │ destination tile lowered             │ DIES    │
/// │ exit edge blocked OR entry blocked   │ DIES    │
/// │ Otherwise                            │ SURVIVE │
/// └──────────────────────────────────────┴─────────┘
///
/// ### Exit edge (tile the player stands on)
/// ┌──────────────────────────────┬──────────────────────────┐
/// │ Current tile type            │ Blocked?                 │
/// ├──────────────────────────────┼──────────────────────────┤
/// │ Pathless / Empty / Border    │ never                    │
/// │ anything else                │ mask[dir] closed         │
/// └──────────────────────────────┴──────────────────────────┘
///
/// ### Entry edge (destination tile)
/// ┌──────────────────────────────┬──────────────────────────┐
/// │ Destination tile type        │ Blocked?                 │
/// ├──────────────────────────────┼──────────────────────────┤
/// │ End                          │ never                    │
/// │ Pathless / Empty / Border    │ never                    │
/// │ anything else                │ mask[inverse(dir)] closed│
/// └──────────────────────────────┴──────────────────────────┘
///
/// Moving east therefore needs the current East bit and the
/// destination West bit; moving south needs South then North.
///
/// ## Win
/// The destination holds the End tile. Checked before the walk table so
/// a move that would both win and kill resolves as a win.

use crate::error::SimError;

use super::direction::{Direction, Pos};
use super::grid::Grid;
use super::tile::{Tile, TileType};

/// Where a walk from `from` in `dir` lands, without wrapping.
/// `None` when it would leave the grid.
pub fn walk_target(grid: &Grid, from: Pos, dir: Direction) -> Option<Pos> {
    dir.step_raw(from).filter(|p| grid.in_bounds(*p))
}

// ── Edge checks ──

#[inline]
pub fn exit_blocked(current: &Tile, dir: Direction) -> bool {
    if current.kind.is_always_open() {
        return false;
    }
    !current.mask.is_open(dir)
}

#[inline]
pub fn entry_blocked(dest: &Tile, dir: Direction) -> bool {
    if dest.kind == TileType::End || dest.kind.is_always_open() {
        return false;
    }
    !dest.mask.is_open(dir.inverse())
}

// ── Survival ──

/// Would the player die walking from `current` in `dir`?
/// See the walk truth table above.
pub fn dies_on_movement(grid: &Grid, current: Pos, dir: Direction) -> Result<bool, SimError> {
    grid.check(current)?;

    let dest = match walk_target(grid, current, dir) {
        Some(p) => p,
        None => return Ok(true),
    };
    let here = match grid.tile_at(current)? {
        Some(t) => t,
        None => return Ok(true),
    };
    let there = match grid.tile_at(dest)? {
        Some(t) => t,
        None => return Ok(true),
    };
    if !there.raised {
        return Ok(true);
    }

    Ok(exit_blocked(here, dir) || entry_blocked(there, dir))
}

// ── Win ──

/// Is `pos` the End tile? Positions off the grid never win.
pub fn check_for_win(grid: &Grid, pos: Pos) -> bool {
    matches!(grid.tile_at(pos), Ok(Some(t)) if t.kind == TileType::End)
}
