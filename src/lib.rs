//! Position cache for a Quoridor engine.
//!
//! Positions are stored in one `GrowHash` per number of walls on the board, see `generations`.

pub mod generations;
pub mod hash;
pub mod position;
mod tests;

pub use generations::{GenerationCache, PositionCache};
pub use hash::{GrowHash, GrowHashError, GrowHashSettings};
