use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::square::{Direction, BOARD_SIZE};

/// Number of wall grooves along each axis, and of wall positions within a groove
pub const WALL_SLOTS: u8 = BOARD_SIZE - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    Column = 0,
    Row = 1,
}

/// A pawn move or a wall placement, encoded in a single byte.
///
/// The low bit is set for wall placements. For a wall, bit 1 selects row or column,
/// bits 2-4 give the groove and bits 5-7 the position within the groove.
/// For a pawn move, the remaining seven bits hold the signed square offset.
/// The all-zero byte is the null move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    inner: u8,
}

impl Move {
    pub const fn null() -> Self {
        Move { inner: 0 }
    }

    pub const fn from_u8(inner: u8) -> Self {
        Move { inner }
    }

    pub const fn wall(orientation: Orientation, groove: u8, position: u8) -> Self {
        assert!(groove < WALL_SLOTS && position < WALL_SLOTS);
        Move {
            inner: (position << 5) | (groove << 2) | ((orientation as u8) << 1) | 1,
        }
    }

    /// A pawn move of up to two squares along each axis
    pub const fn pawn(delta_x: i8, delta_y: i8) -> Self {
        assert!(-3 < delta_x && delta_x < 3 && -3 < delta_y && delta_y < 3);
        Move::pawn_offset(delta_x + BOARD_SIZE as i8 * delta_y)
    }

    pub const fn step(direction: Direction) -> Self {
        Move::pawn_offset(direction.offset())
    }

    const fn pawn_offset(offset: i8) -> Self {
        Move {
            inner: (offset << 1) as u8,
        }
    }

    pub const fn into_inner(self) -> u8 {
        self.inner
    }

    /// False for the null move
    pub const fn exists(self) -> bool {
        self.inner != 0
    }

    pub const fn is_wall(self) -> bool {
        self.inner & 0x01 != 0
    }

    pub const fn is_pawn_move(self) -> bool {
        !self.is_wall()
    }

    pub const fn wall_orientation(self) -> Orientation {
        if self.inner & 0x02 != 0 {
            Orientation::Row
        } else {
            Orientation::Column
        }
    }

    pub const fn wall_groove(self) -> u8 {
        (self.inner & 0x1f) >> 2
    }

    pub const fn wall_position(self) -> u8 {
        self.inner >> 5
    }

    /// Signed square offset of a pawn move
    pub const fn pawn_offset_value(self) -> i8 {
        (self.inner as i8) >> 1
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.exists() {
            write!(f, "null")
        } else if self.is_wall() {
            let orientation = match self.wall_orientation() {
                Orientation::Row => 'h',
                Orientation::Column => 'v',
            };
            write!(
                f,
                "{}{}{}",
                (b'a' + self.wall_position()) as char,
                self.wall_groove() + 1,
                orientation
            )
        } else {
            write!(f, "pawn{:+}", self.pawn_offset_value())
        }
    }
}
