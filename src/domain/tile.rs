/// Tile types, direction masks and attributes.
///
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here. Nothing in this module
/// looks at the grid.

use super::direction::{Direction, Pos};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileType {
    Start,
    End,
    Straight,
    Curve,
    TCrossing,
    Pathless,
    Border,
    Empty,
}

impl TileType {
    /// Start, End and Border never slide.
    pub fn is_movable(self) -> bool {
        !matches!(self, TileType::Start | TileType::End | TileType::Border)
    }

    /// Tiles that never block the player on the way in or out.
    pub fn is_always_open(self) -> bool {
        matches!(self, TileType::Pathless | TileType::Empty | TileType::Border)
    }

    /// Unrotated mask for a freshly authored tile.
    pub fn preset_mask(self) -> DirectionMask {
        match self {
            TileType::Straight => DirectionMask::new([true, false, true, false]),
            TileType::Curve => DirectionMask::new([true, false, false, true]),
            TileType::TCrossing => DirectionMask::new([true, true, false, true]),
            TileType::Start | TileType::End => DirectionMask::new([true, false, false, false]),
            TileType::Pathless | TileType::Border | TileType::Empty => DirectionMask::CLOSED,
        }
    }
}

/// Which edges of a tile are traversable, ordered `[N, E, S, W]`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DirectionMask([bool; 4]);

impl DirectionMask {
    pub const CLOSED: DirectionMask = DirectionMask([false; 4]);

    pub const fn new(bits: [bool; 4]) -> Self {
        DirectionMask(bits)
    }

    pub fn bits(self) -> [bool; 4] {
        self.0
    }

    #[inline]
    pub fn is_open(self, dir: Direction) -> bool {
        self.0[dir.index()]
    }

    /// `[N,E,S,W] -> [E,S,W,N]`: a quarter turn counter-clockwise.
    pub fn rotate_left(self) -> Self {
        let [n, e, s, w] = self.0;
        DirectionMask([e, s, w, n])
    }

    /// Inverse of `rotate_left`: a quarter turn clockwise.
    pub fn rotate_right(self) -> Self {
        let [n, e, s, w] = self.0;
        DirectionMask([w, n, e, s])
    }
}

/// Behavioral attribute authored on a tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Attribute {
    #[default]
    None,
    /// Refuses every move started from this tile.
    Immobile,
    /// Inverts the direction the player walks after a move.
    Reverse,
}

impl Attribute {
    /// Move-validity override. `None` means "no opinion, use the ring walk".
    pub fn move_validate(self) -> Option<bool> {
        match self {
            Attribute::None | Attribute::Reverse => None,
            Attribute::Immobile => Some(false),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tile {
    pub kind: TileType,
    pub mask: DirectionMask,
    pub attribute: Attribute,
    /// Clockwise quarter turns from the preset orientation, `0..4`.
    pub rotation: u8,
    /// Raised tiles can be walked on; the Start tile sinks after the first step.
    pub raised: bool,
    /// Authoring position, used by restart.
    pub home: Pos,
}

impl Tile {
    pub fn new(kind: TileType, home: Pos) -> Self {
        Tile {
            kind,
            mask: kind.preset_mask(),
            attribute: Attribute::None,
            rotation: 0,
            raised: true,
            home,
        }
    }

    /// Apply `turns` clockwise quarter turns to a fresh tile.
    pub fn rotated(mut self, turns: u8) -> Self {
        for _ in 0..turns % 4 {
            self.rotate_right();
        }
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn directions(&self) -> [bool; 4] {
        self.mask.bits()
    }

    pub fn rotate_left(&mut self) {
        self.mask = self.mask.rotate_left();
        self.rotation = (self.rotation + 3) % 4;
    }

    pub fn rotate_right(&mut self) {
        self.mask = self.mask.rotate_right();
        self.rotation = (self.rotation + 1) % 4;
    }

    #[inline]
    pub fn is_movable(&self) -> bool {
        self.kind.is_movable()
    }

    pub fn is_reverse(&self) -> bool {
        self.attribute == Attribute::Reverse
    }
}
