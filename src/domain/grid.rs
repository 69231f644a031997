/// Grid topology: a rectangular board of tile slots that wraps around
/// on both axes.
///
/// Slots are stored row-major. A slot holds at most one tile; `None` is a
/// vacancy the movement engine can slide tiles into.
///
/// All index arithmetic goes through `next_index`, which is the only
/// place that wraps. Raw indices handed in from outside are validated
/// and rejected with `SimError::IndexOutOfRange`, never clamped.

use crate::error::SimError;

use super::direction::{Direction, Pos};
use super::tile::{Tile, TileType};

#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    slots: Vec<Option<Tile>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidGridSize { width, height });
        }
        Ok(Grid { width, height, slots: vec![None; width * height] })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    // ── Bounds ──

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Bounds check for signed raw coordinates, before any wrap resolution.
    pub fn index_in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    pub fn check(&self, pos: Pos) -> Result<(), SimError> {
        if self.in_bounds(pos) {
            Ok(())
        } else {
            Err(self.out_of_range(pos))
        }
    }

    fn out_of_range(&self, pos: Pos) -> SimError {
        SimError::IndexOutOfRange {
            x: pos.x as i64,
            y: pos.y as i64,
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    fn offset(&self, pos: Pos) -> usize {
        pos.y * self.width + pos.x
    }

    // ── Slot access ──

    pub fn tile_at(&self, pos: Pos) -> Result<Option<&Tile>, SimError> {
        self.check(pos)?;
        Ok(self.slots[self.offset(pos)].as_ref())
    }

    pub fn tile_at_mut(&mut self, pos: Pos) -> Result<Option<&mut Tile>, SimError> {
        self.check(pos)?;
        let i = self.offset(pos);
        Ok(self.slots[i].as_mut())
    }

    /// Put `tile` into `pos`, returning whatever was there.
    pub fn place(&mut self, pos: Pos, tile: Tile) -> Result<Option<Tile>, SimError> {
        self.check(pos)?;
        let i = self.offset(pos);
        Ok(self.slots[i].replace(tile))
    }

    /// Empty the slot at `pos`, returning its tile.
    pub fn take(&mut self, pos: Pos) -> Result<Option<Tile>, SimError> {
        self.check(pos)?;
        let i = self.offset(pos);
        Ok(self.slots[i].take())
    }

    /// Unchecked read for positions that already came out of this grid.
    #[inline]
    pub(crate) fn slot(&self, pos: Pos) -> Option<&Tile> {
        self.slots.get(self.offset(pos)).and_then(|s| s.as_ref())
    }

    /// Every position, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Pos::new(x, y)))
    }

    pub fn tiles(&self) -> impl Iterator<Item = (Pos, &Tile)> + '_ {
        self.positions().filter_map(move |p| self.slot(p).map(|t| (p, t)))
    }

    /// First tile of the given type, scanning row by row.
    pub fn find(&self, kind: TileType) -> Option<Pos> {
        self.tiles().find(|(_, t)| t.kind == kind).map(|(p, _)| p)
    }

    pub fn count(&self, kind: TileType) -> usize {
        self.tiles().filter(|(_, t)| t.kind == kind).count()
    }

    // ── Wrap-around topology ──

    /// Number of slots in the ring `dir` travels along.
    pub fn ring_len(&self, dir: Direction) -> usize {
        if dir.is_horizontal() { self.width } else { self.height }
    }

    /// One step with wrap-around and no skipping.
    fn wrap_step(&self, from: Pos, dir: Direction) -> Pos {
        match dir {
            Direction::East => Pos::new((from.x + 1) % self.width, from.y),
            Direction::West => Pos::new((from.x + self.width - 1) % self.width, from.y),
            Direction::South => Pos::new(from.x, (from.y + 1) % self.height),
            Direction::North => Pos::new(from.x, (from.y + self.height - 1) % self.height),
        }
    }

    /// Next index from `from` in `dir`, wrapping at the edges.
    ///
    /// With `overwrite` false, immovable tiles are skipped so the result is
    /// the next slot a sliding tile could land in. The skip gives up after a
    /// full lap; on a ring with nothing else to land on the result is `from`.
    pub fn next_index(&self, from: Pos, dir: Direction, overwrite: bool) -> Result<Pos, SimError> {
        self.check(from)?;
        let mut next = self.wrap_step(from, dir);
        if overwrite {
            return Ok(next);
        }
        for _ in 0..self.ring_len(dir) {
            if next == from {
                break;
            }
            match self.slot(next) {
                Some(tile) if !tile.is_movable() => next = self.wrap_step(next, dir),
                _ => break,
            }
        }
        Ok(next)
    }

    /// Does the step from `from` in `dir` cross a grid boundary?
    pub fn will_teleport(&self, from: Pos, dir: Direction) -> Result<bool, SimError> {
        let next = self.next_index(from, dir, false)?;
        Ok(match dir {
            Direction::East => next.x < from.x,
            Direction::West => next.x > from.x,
            Direction::South => next.y < from.y,
            Direction::North => next.y > from.y,
        })
    }
}
