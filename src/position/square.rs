use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: u8 = 9;
pub const NUM_SQUARES: u8 = BOARD_SIZE * BOARD_SIZE;

/// Offsets that can be added together to move between any two squares
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(i8)]
pub enum Direction {
    Left = -1,
    Right = 1,
    Down = -(BOARD_SIZE as i8),
    Up = BOARD_SIZE as i8,
}

impl Direction {
    pub const fn offset(self) -> i8 {
        self as i8
    }

    pub const fn all() -> [Direction; 4] {
        [Direction::Left, Direction::Right, Direction::Down, Direction::Up]
    }

    pub const fn reverse(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }
}

/// A location on the 9x9 board, numbered `x + 9 * y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Square {
    inner: u8,
}

impl Square {
    pub const fn from_u8(inner: u8) -> Self {
        assert!(inner < NUM_SQUARES);
        Square { inner }
    }

    pub const fn from_xy(x: u8, y: u8) -> Self {
        assert!(x < BOARD_SIZE && y < BOARD_SIZE);
        Square::from_u8(x + BOARD_SIZE * y)
    }

    pub const fn into_inner(self) -> u8 {
        self.inner
    }

    pub const fn x(self) -> u8 {
        self.inner % BOARD_SIZE
    }

    pub const fn y(self) -> u8 {
        self.inner / BOARD_SIZE
    }

    pub fn go_direction(self, direction: Direction) -> Option<Self> {
        self.jump(direction.offset())
    }

    /// Move by a raw square offset, as found in pawn moves.
    /// Returns `None` if the destination is off the board, or if the move wraps around an edge.
    pub fn jump(self, offset: i8) -> Option<Self> {
        let target = self.inner as i16 + offset as i16;
        if !(0..NUM_SQUARES as i16).contains(&target) {
            return None;
        }
        let target = Square::from_u8(target as u8);
        let dx = (target.x() as i16 - self.x() as i16).abs();
        let dy = (target.y() as i16 - self.y() as i16).abs();
        // A pawn never moves more than two squares along either axis
        if dx > 2 || dy > 2 {
            None
        } else {
            Some(target)
        }
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..NUM_SQUARES).map(Square::from_u8)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.x()) as char, self.y() + 1)
    }
}
