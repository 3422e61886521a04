#[cfg(test)]
mod grow_hash_tests;

#[cfg(test)]
use crate::position::{Move, Position};

/// Plays a list of moves from the start position, returning every position reached
#[cfg(test)]
fn positions_after_moves(moves: &[Move]) -> Vec<Position> {
    let mut position = Position::default();
    let mut positions = vec![position];
    for mv in moves {
        position.do_move(*mv);
        positions.push(position);
    }
    positions
}
