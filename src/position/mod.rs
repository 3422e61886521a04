//! Quoridor position representation, as stored in the position cache.
//!
//! These types only record state. They do not check whether a move is legal.

use std::fmt;

use bytemuck::{Pod, Zeroable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use mv::{Move, Orientation, WALL_SLOTS};
pub use square::{Direction, Square, BOARD_SIZE, NUM_SQUARES};

use crate::hash::GrowHash;

mod mv;
mod square;

pub const WALLS_PER_PLAYER: u8 = 10;
pub const MAX_WALLS: u8 = 2 * WALLS_PER_PLAYER;

/// Type alias for winning probability, used for scoring positions.
pub type Score = f32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Player {
    White = 0,
    Black = 1,
}

impl Player {
    pub const fn id(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    const fn from_id(id: u8) -> Player {
        match id {
            0 => Player::White,
            1 => Player::Black,
            _ => panic!("Invalid player id"),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::White => write!(f, "white"),
            Player::Black => write!(f, "black"),
        }
    }
}

/// A Quoridor position, laid out as plain bytes so it can be hashed and compared directly.
///
/// Walls are stored as one bit per (groove, position) pair, in separate boards for row and
/// column walls.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct Position {
    row_walls: u64,
    column_walls: u64,
    pawns: [u8; 2],
    walls_left: [u8; 2],
    side_to_move: u8,
    reserved: [u8; 3],
}

impl Default for Position {
    fn default() -> Self {
        Position {
            row_walls: 0,
            column_walls: 0,
            pawns: [
                Square::from_xy(BOARD_SIZE / 2, 0).into_inner(),
                Square::from_xy(BOARD_SIZE / 2, BOARD_SIZE - 1).into_inner(),
            ],
            walls_left: [WALLS_PER_PLAYER; 2],
            side_to_move: Player::White as u8,
            reserved: [0; 3],
        }
    }
}

impl Position {
    pub fn side_to_move(&self) -> Player {
        Player::from_id(self.side_to_move)
    }

    pub fn pawn(&self, player: Player) -> Square {
        Square::from_u8(self.pawns[player.id()])
    }

    pub fn walls_left(&self, player: Player) -> u8 {
        self.walls_left[player.id()]
    }

    /// Number of walls on the board. Never decreases during a game.
    pub fn walls_placed(&self) -> u8 {
        (self.row_walls.count_ones() + self.column_walls.count_ones()) as u8
    }

    pub fn has_wall(&self, orientation: Orientation, groove: u8, position: u8) -> bool {
        self.walls(orientation) & wall_bit(groove, position) != 0
    }

    /// Applies a move for the side to move. The move is assumed to be legal, apart from
    /// the basic sanity checks below.
    pub fn do_move(&mut self, mv: Move) {
        assert!(mv.exists(), "Cannot apply the null move");
        let mover = self.side_to_move();
        if mv.is_wall() {
            let bit = wall_bit(mv.wall_groove(), mv.wall_position());
            assert!(
                self.walls_left[mover.id()] > 0,
                "{} has no walls left",
                mover
            );
            assert!(
                self.walls(mv.wall_orientation()) & bit == 0,
                "Wall {} is already placed",
                mv
            );
            match mv.wall_orientation() {
                Orientation::Row => self.row_walls |= bit,
                Orientation::Column => self.column_walls |= bit,
            }
            self.walls_left[mover.id()] -= 1;
        } else {
            let destination = self
                .pawn(mover)
                .jump(mv.pawn_offset_value())
                .unwrap_or_else(|| panic!("Pawn move {} leaves the board", mv));
            self.pawns[mover.id()] = destination.into_inner();
        }
        self.side_to_move = mover.other() as u8;
    }

    fn walls(&self, orientation: Orientation) -> u64 {
        match orientation {
            Orientation::Row => self.row_walls,
            Orientation::Column => self.column_walls,
        }
    }
}

fn wall_bit(groove: u8, position: u8) -> u64 {
    assert!(groove < WALL_SLOTS && position < WALL_SLOTS);
    1u64 << (groove * WALL_SLOTS + position)
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("white", &self.pawn(Player::White).to_string())
            .field("black", &self.pawn(Player::Black).to_string())
            .field("walls_placed", &self.walls_placed())
            .field("walls_left", &self.walls_left)
            .field("side_to_move", &self.side_to_move())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Bound {
    #[default]
    Unknown,
    Exact,
    Lower,
    Upper,
}

/// Cached search result for a position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionInfo {
    pub score: Score,
    /// Number of directly computed positions that contributed to the score.
    /// A position evaluated from scratch counts one. Positions that took more work
    /// to derive are more valuable to keep.
    pub computations: u32,
    pub depth: u8,
    pub bound: Bound,
}

impl PositionInfo {
    pub fn is_computed(&self) -> bool {
        self.computations > 0
    }

    /// Record a directly evaluated score
    pub fn set_evaluated(&mut self, score: Score) {
        self.score = score;
        self.computations = 1;
        self.depth = 0;
        self.bound = Bound::Exact;
    }

    /// Record a score derived from child positions
    pub fn set_derived<'a>(
        &mut self,
        score: Score,
        depth: u8,
        bound: Bound,
        children: impl IntoIterator<Item = &'a PositionInfo>,
    ) {
        self.score = score;
        self.depth = depth;
        self.bound = bound;
        self.computations = children
            .into_iter()
            .fold(0u32, |sum, child| sum.saturating_add(child.computations))
            .max(1);
    }
}

/// The table used for a single generation of cached positions
pub type PositionInfoHash = GrowHash<Position, PositionInfo>;
