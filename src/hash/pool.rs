use std::{error, fmt, mem};

use log::debug;

/// Handle to a slot inside a `SlotPool`. Stays valid until the slot is released.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct SlotId {
    block: u32,
    offset: u32,
}

/// One key/value storage unit. `next` links the slot into a bucket chain while it is live.
#[derive(Debug)]
pub(crate) struct Slot<K, V> {
    pub key: K,
    pub value: V,
    pub next: Option<SlotId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    AllocationFailed(usize),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::AllocationFailed(num_bytes) => {
                write!(f, "Failed to allocate {} bytes for slot block", num_bytes)
            }
        }
    }
}

impl error::Error for PoolError {}

/// Block allocator for hash table slots.
///
/// Slots are handed out one at a time, either from the free list or from the unused capacity
/// of the newest block. Every block has its capacity reserved exactly once, so it never moves.
/// Released slots go on the free list and are only returned to the system when the whole pool
/// is dropped.
pub(crate) struct SlotPool<K, V> {
    blocks: Vec<Vec<Slot<K, V>>>,
    free: Vec<SlotId>,
    initial_block_size: usize,
    block_grow_size: usize,
}

impl<K, V> SlotPool<K, V> {
    pub fn new(initial_block_size: usize, block_grow_size: usize) -> Self {
        debug_assert!(initial_block_size > 0 && block_grow_size > 0);
        SlotPool {
            blocks: Vec::new(),
            free: Vec::new(),
            initial_block_size,
            block_grow_size,
        }
    }

    /// Draws a slot and fills it with `make`.
    /// If a new block is needed and cannot be allocated, the pool is left unchanged and
    /// `make` is never called.
    pub fn allocate<F>(&mut self, make: F) -> Result<SlotId, PoolError>
    where
        F: FnOnce() -> Slot<K, V>,
    {
        if let Some(id) = self.free.pop() {
            *self.get_mut(id) = make();
            return Ok(id);
        }
        if self.current_block_is_full() {
            self.add_block()?;
        }
        let block_index = self.blocks.len() - 1;
        let block = &mut self.blocks[block_index];
        debug_assert!(block.len() < block.capacity());
        let offset = block.len();
        block.push(make());
        Ok(SlotId {
            block: block_index as u32,
            offset: offset as u32,
        })
    }

    /// Puts a slot on the free list. Its contents are left in place until it is reused.
    pub fn release(&mut self, id: SlotId) {
        self.free.push(id);
    }

    pub fn get(&self, id: SlotId) -> &Slot<K, V> {
        &self.blocks[id.block as usize][id.offset as usize]
    }

    pub fn get_mut(&mut self, id: SlotId) -> &mut Slot<K, V> {
        &mut self.blocks[id.block as usize][id.offset as usize]
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total number of slots in all blocks, including unused and freed ones
    pub fn capacity(&self) -> usize {
        self.blocks.iter().map(|block| block.capacity()).sum()
    }

    pub fn free_slots(&self) -> usize {
        self.free.len()
    }

    pub fn mem_usage(&self) -> usize {
        self.capacity() * mem::size_of::<Slot<K, V>>()
            + self.free.capacity() * mem::size_of::<SlotId>()
            + self.blocks.capacity() * mem::size_of::<Vec<Slot<K, V>>>()
    }

    /// Drops every block at once, returning how many were released
    pub fn destroy(self) -> usize {
        let num_blocks = self.blocks.len();
        drop(self);
        num_blocks
    }

    fn current_block_is_full(&self) -> bool {
        self.blocks
            .last()
            .map_or(true, |block| block.len() == block.capacity())
    }

    fn add_block(&mut self) -> Result<(), PoolError> {
        let block_size = if self.blocks.is_empty() {
            self.initial_block_size
        } else {
            self.block_grow_size
        };
        let num_bytes = block_size.saturating_mul(mem::size_of::<Slot<K, V>>());

        self.blocks
            .try_reserve(1)
            .map_err(|_| PoolError::AllocationFailed(mem::size_of::<Vec<Slot<K, V>>>()))?;
        let mut block = Vec::new();
        block
            .try_reserve_exact(block_size)
            .map_err(|_| PoolError::AllocationFailed(num_bytes))?;

        debug!(
            "Allocated slot block #{} with {} slots ({} bytes)",
            self.blocks.len(),
            block.capacity(),
            num_bytes
        );
        self.blocks.push(block);
        Ok(())
    }
}
