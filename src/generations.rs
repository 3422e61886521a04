//! One hash table per number of walls on the board.
//!
//! Walls are never removed, so once a wall is placed every position with fewer walls is
//! unreachable. Keeping each wall count in its own `GrowHash` means such positions can be
//! thrown away a whole table at a time. Deciding which generations to drop is left to the
//! caller.

use std::array;

use arrayvec::ArrayVec;
use log::debug;

use crate::hash::{
    ByteHash, GrowHash, GrowHashError, GrowHashSettings, HashStrategy, TeardownStats,
};
use crate::position::{Position, PositionInfo, MAX_WALLS};

pub const NUM_GENERATIONS: usize = MAX_WALLS as usize + 1;

pub struct GenerationCache<K, V, S = ByteHash> {
    generations: [Option<GrowHash<K, V, S>>; NUM_GENERATIONS],
    settings: GrowHashSettings,
    strategy: S,
}

/// The cache used by the search, keyed by position
pub type PositionCache = GenerationCache<Position, PositionInfo>;

impl<K, V, S> GenerationCache<K, V, S>
where
    K: Eq,
    S: HashStrategy<K, V> + Clone,
{
    /// Creates an empty cache. Tables are only allocated once a generation is first written to.
    pub fn new(strategy: S, settings: GrowHashSettings) -> Result<Self, GrowHashError> {
        settings
            .validate()
            .map_err(GrowHashError::InvalidSettings)?;
        Ok(GenerationCache {
            generations: array::from_fn(|_| None),
            settings,
            strategy,
        })
    }

    pub fn get(&self, walls: u8, key: &K) -> Option<&V> {
        self.generation(walls)?.get(key)
    }

    pub fn get_mut(&mut self, walls: u8, key: &K) -> Option<&mut V> {
        self.generation_mut(walls)?.get_mut(key)
    }

    /// Returns the entry for `key` in generation `walls`, creating the entry,
    /// and the generation's table, if necessary
    pub fn add(&mut self, walls: u8, key: &K) -> Result<&mut V, GrowHashError>
    where
        K: Clone,
    {
        self.open(walls)?.add(key)
    }

    pub fn remove(&mut self, walls: u8, key: &K) -> bool {
        self.generation_mut(walls)
            .is_some_and(|generation| generation.remove(key))
    }

    /// The table for generation `walls`, creating it if it doesn't exist yet
    pub fn open(&mut self, walls: u8) -> Result<&mut GrowHash<K, V, S>, GrowHashError> {
        let entry = &mut self.generations[generation_index(walls)];
        let generation = match entry.take() {
            Some(generation) => generation,
            None => {
                let generation =
                    GrowHash::with_settings(self.strategy.clone(), self.settings.clone())?;
                debug!("Opened generation for {} walls", walls);
                generation
            }
        };
        Ok(entry.insert(generation))
    }
}

impl<K, V, S> GenerationCache<K, V, S> {
    pub fn generation(&self, walls: u8) -> Option<&GrowHash<K, V, S>> {
        self.generations[generation_index(walls)].as_ref()
    }

    pub fn generation_mut(&mut self, walls: u8) -> Option<&mut GrowHash<K, V, S>> {
        self.generations[generation_index(walls)].as_mut()
    }

    pub fn is_open(&self, walls: u8) -> bool {
        self.generation(walls).is_some()
    }

    /// Wall counts of all generations that currently have a table
    pub fn open_generations(&self) -> ArrayVec<u8, NUM_GENERATIONS> {
        self.generations
            .iter()
            .enumerate()
            .filter(|(_, generation)| generation.is_some())
            .map(|(walls, _)| walls as u8)
            .collect()
    }

    /// Destroys generation `walls`. Returns `None` if it was not open.
    pub fn discard(&mut self, walls: u8) -> Option<TeardownStats> {
        let generation = self.generations[generation_index(walls)].take()?;
        let stats = generation.destroy();
        debug!(
            "Discarded generation for {} walls: {} positions, {} blocks",
            walls, stats.elements, stats.blocks
        );
        Some(stats)
    }

    /// Destroys every generation with fewer than `walls` walls.
    /// Call this once a wall has been played, as those positions can never occur again.
    pub fn discard_below(&mut self, walls: u8) -> TeardownStats {
        let mut total = TeardownStats::default();
        for lower in 0..walls.min(NUM_GENERATIONS as u8) {
            if let Some(stats) = self.discard(lower) {
                total += stats;
            }
        }
        total
    }

    /// Total number of entries across all generations
    pub fn len(&self) -> usize {
        self.generations.iter().flatten().map(GrowHash::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mem_usage(&self) -> usize {
        self.generations
            .iter()
            .flatten()
            .map(GrowHash::mem_usage)
            .sum()
    }

    pub fn settings(&self) -> &GrowHashSettings {
        &self.settings
    }
}

impl<S> GenerationCache<Position, PositionInfo, S>
where
    S: HashStrategy<Position, PositionInfo> + Clone,
{
    pub fn lookup(&self, position: &Position) -> Option<&PositionInfo> {
        self.get(position.walls_placed(), position)
    }

    pub fn entry(&mut self, position: &Position) -> Result<&mut PositionInfo, GrowHashError> {
        self.add(position.walls_placed(), position)
    }

    pub fn forget(&mut self, position: &Position) -> bool {
        self.remove(position.walls_placed(), position)
    }
}

fn generation_index(walls: u8) -> usize {
    assert!(
        (walls as usize) < NUM_GENERATIONS,
        "Wall count {} out of range, at most {} walls can be placed",
        walls,
        MAX_WALLS
    );
    walls as usize
}
