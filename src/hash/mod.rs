//! A chained hash table built for one-at-a-time growth and whole-table destruction.
//!
//! Each table draws its slots from a block pool, so dropping a table frees a handful of
//! blocks instead of every element. Removing single elements is supported, but the freed
//! slots are only recycled, never returned to the system, until the table itself goes away.

use std::{error, fmt};

use log::debug;

use self::pool::{PoolError, Slot, SlotId, SlotPool};

pub(crate) mod pool;
mod settings;
mod strategy;

pub use settings::{available_memory, GrowHashSettings, MAX_BUCKETS};
pub use strategy::{hash_bytes, ByteHash, FnStrategy, HashStrategy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrowHashError {
    AllocationFailed(usize),
    InvalidSettings(&'static str),
}

impl fmt::Display for GrowHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowHashError::AllocationFailed(num_bytes) => {
                write!(f, "Failed to allocate {} bytes for hash table", num_bytes)
            }
            GrowHashError::InvalidSettings(reason) => {
                write!(f, "Invalid hash table settings: {}", reason)
            }
        }
    }
}

impl error::Error for GrowHashError {}

impl From<PoolError> for GrowHashError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::AllocationFailed(num_bytes) => GrowHashError::AllocationFailed(num_bytes),
        }
    }
}

/// What was thrown away when a table was destroyed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownStats {
    pub blocks: usize,
    pub elements: usize,
}

impl std::ops::AddAssign for TeardownStats {
    fn add_assign(&mut self, rhs: Self) {
        self.blocks += rhs.blocks;
        self.elements += rhs.elements;
    }
}

pub struct GrowHash<K, V, S = ByteHash> {
    buckets: Box<[Option<SlotId>]>,
    pool: SlotPool<K, V>,
    len: usize,
    strategy: S,
}

impl<K, V, S> GrowHash<K, V, S>
where
    K: Eq,
    S: HashStrategy<K, V>,
{
    pub fn new(strategy: S) -> Result<Self, GrowHashError> {
        Self::with_settings(strategy, GrowHashSettings::default())
    }

    pub fn with_settings(strategy: S, settings: GrowHashSettings) -> Result<Self, GrowHashError> {
        settings
            .validate()
            .map_err(GrowHashError::InvalidSettings)?;

        let bucket_count = settings.get_bucket_count();
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(bucket_count).map_err(|_| {
            GrowHashError::AllocationFailed(bucket_count * std::mem::size_of::<Option<SlotId>>())
        })?;
        buckets.resize(bucket_count, None);

        Ok(GrowHash {
            buckets: buckets.into_boxed_slice(),
            pool: SlotPool::new(
                settings.get_initial_block_size(),
                settings.get_block_grow_size(),
            ),
            len: 0,
            strategy,
        })
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|id| &self.pool.get(id).value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.find(key).map(|id| &mut self.pool.get_mut(id).value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Returns the value stored for `key`, creating it first if the key is not present.
    /// On allocation failure, the table is unchanged.
    pub fn add(&mut self, key: &K) -> Result<&mut V, GrowHashError>
    where
        K: Clone,
    {
        if let Some(id) = self.find(key) {
            return Ok(&mut self.pool.get_mut(id).value);
        }

        let bucket = self.bucket_index(key);
        let head = self.buckets[bucket];
        let strategy = &self.strategy;
        let id = self.pool.allocate(|| Slot {
            key: key.clone(),
            value: strategy.init(key),
            next: head,
        })?;
        self.buckets[bucket] = Some(id);
        self.len += 1;

        Ok(&mut self.pool.get_mut(id).value)
    }

    /// Removes `key` from the table. Returns false if it wasn't present.
    pub fn remove(&mut self, key: &K) -> bool {
        let bucket = self.bucket_index(key);
        let mut previous: Option<SlotId> = None;
        let mut current = self.buckets[bucket];

        while let Some(id) = current {
            let slot = self.pool.get(id);
            let next = slot.next;
            if slot.key == *key {
                match previous {
                    Some(previous) => self.pool.get_mut(previous).next = next,
                    None => self.buckets[bucket] = next,
                }
                self.pool.release(id);
                self.len -= 1;
                return true;
            }
            previous = current;
            current = next;
        }
        false
    }

    fn find(&self, key: &K) -> Option<SlotId> {
        let mut current = self.buckets[self.bucket_index(key)];
        while let Some(id) = current {
            let slot = self.pool.get(id);
            if slot.key == *key {
                return Some(id);
            }
            current = slot.next;
        }
        None
    }

    fn bucket_index(&self, key: &K) -> usize {
        self.strategy.hash(key) as usize % self.buckets.len()
    }
}

impl<K, V, S> GrowHash<K, V, S> {
    /// Number of live elements
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn block_count(&self) -> usize {
        self.pool.block_count()
    }

    /// Number of slots the table can hold before allocating another block,
    /// counting live, freed and unused slots
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn free_slots(&self) -> usize {
        self.pool.free_slots()
    }

    /// Approximate heap usage in bytes
    pub fn mem_usage(&self) -> usize {
        self.buckets.len() * std::mem::size_of::<Option<SlotId>>() + self.pool.mem_usage()
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn longest_chain(&self) -> usize {
        (0..self.buckets.len())
            .map(|bucket| self.chain(bucket).count())
            .max()
            .unwrap_or(0)
    }

    /// Iterates over all live entries, bucket by bucket
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        (0..self.buckets.len())
            .flat_map(move |bucket| self.chain(bucket))
            .map(move |id| {
                let slot = self.pool.get(id);
                (&slot.key, &slot.value)
            })
    }

    /// Destroys the table by dropping its blocks, without visiting the chains
    pub fn destroy(self) -> TeardownStats {
        let elements = self.len;
        let blocks = self.pool.destroy();
        debug!(
            "Destroyed hash table with {} elements in {} blocks",
            elements, blocks
        );
        TeardownStats { blocks, elements }
    }

    fn chain(&self, bucket: usize) -> impl Iterator<Item = SlotId> + '_ {
        let mut current = self.buckets[bucket];
        std::iter::from_fn(move || {
            let id = current?;
            current = self.pool.get(id).next;
            Some(id)
        })
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for GrowHash<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
