/// Directions and grid indices.
///
/// Rows grow southwards: `North` is `(0, -1)` and `South` is `(0, +1)`.
/// The discriminant order matches the `[N, E, S, W]` direction mask.

use crate::error::SimError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];

    /// Slot of this direction in a `[N, E, S, W]` mask.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn inverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Unit vector `(dx, dy)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// True for directions that increase a coordinate (East, South).
    pub fn is_positive(self) -> bool {
        matches!(self, Direction::East | Direction::South)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }

    /// Parse an axis-locked unit vector. Anything else is a caller bug.
    pub fn from_vector(dx: i32, dy: i32) -> Result<Direction, SimError> {
        match (dx, dy) {
            (0, -1) => Ok(Direction::North),
            (1, 0) => Ok(Direction::East),
            (0, 1) => Ok(Direction::South),
            (-1, 0) => Ok(Direction::West),
            _ => Err(SimError::MalformedDirection { dx, dy }),
        }
    }

    /// Step `pos` one cell without wrapping.
    /// `None` when the raw coordinate would go negative; the upper bound is
    /// the grid's business.
    pub fn step_raw(self, pos: Pos) -> Option<Pos> {
        let (dx, dy) = self.delta();
        let x = pos.x as i64 + dx as i64;
        let y = pos.y as i64 + dy as i64;
        if x < 0 || y < 0 {
            return None;
        }
        Some(Pos::new(x as usize, y as usize))
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

/// A grid index: `x` is the column, `y` the row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.inverse().inverse(), d);
            assert_ne!(d.inverse(), d);
        }
    }

    #[test]
    fn vectors_parse_back_to_directions() {
        for d in Direction::ALL {
            let (dx, dy) = d.delta();
            assert_eq!(Direction::from_vector(dx, dy), Ok(d));
        }
    }

    #[test]
    fn diagonal_and_zero_vectors_are_rejected() {
        assert_eq!(
            Direction::from_vector(1, 1),
            Err(SimError::MalformedDirection { dx: 1, dy: 1 })
        );
        assert!(Direction::from_vector(0, 0).is_err());
        assert!(Direction::from_vector(0, 2).is_err());
    }

    #[test]
    fn raw_step_does_not_wrap() {
        assert_eq!(Direction::West.step_raw(Pos::new(0, 3)), None);
        assert_eq!(Direction::North.step_raw(Pos::new(2, 0)), None);
        assert_eq!(Direction::South.step_raw(Pos::new(2, 0)), Some(Pos::new(2, 1)));
        assert_eq!(Direction::East.step_raw(Pos::new(9, 0)), Some(Pos::new(10, 0)));
    }

    #[test]
    fn mask_order_is_nesw() {
        let order: Vec<usize> = Direction::ALL.iter().map(|d| d.index()).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }
}
