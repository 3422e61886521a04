use std::mem;

use super::pool::Slot;

/// Largest useful bucket count, since strategies hash to 16 bits
pub const MAX_BUCKETS: usize = u16::MAX as usize + 1;

/// Construction parameters for a `GrowHash`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GrowHashSettings {
    bucket_count: usize,
    initial_block_size: u32,
    block_grow_size: u32,
}

impl Default for GrowHashSettings {
    fn default() -> Self {
        GrowHashSettings {
            bucket_count: 4096,
            initial_block_size: 1024,
            block_grow_size: 1024,
        }
    }
}

impl GrowHashSettings {
    pub fn bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Number of slots in the first block. Keep this small for tables that may stay nearly empty
    pub fn initial_block_size(mut self, initial_block_size: u32) -> Self {
        self.initial_block_size = initial_block_size;
        self
    }

    /// Number of slots in every block after the first
    pub fn block_grow_size(mut self, block_grow_size: u32) -> Self {
        self.block_grow_size = block_grow_size;
        self
    }

    /// Pick a bucket count for a table expected to fill roughly `mem_usage` bytes,
    /// i.e. one bucket per element that fits
    pub fn mem_usage<K, V>(self, mem_usage: usize) -> Self {
        let slot_size = mem::size_of::<Slot<K, V>>().max(1);
        self.bucket_count((mem_usage / slot_size).clamp(1, MAX_BUCKETS))
    }

    pub fn get_bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn get_initial_block_size(&self) -> usize {
        self.initial_block_size as usize
    }

    pub fn get_block_grow_size(&self) -> usize {
        self.block_grow_size as usize
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.bucket_count == 0 {
            return Err("bucket count must be at least 1");
        }
        if self.bucket_count > MAX_BUCKETS {
            return Err("bucket count cannot exceed the 16-bit hash range");
        }
        if self.initial_block_size == 0 {
            return Err("initial block size must be at least 1");
        }
        if self.block_grow_size == 0 {
            return Err("block grow size must be at least 1");
        }
        Ok(())
    }
}

/// Memory currently available to the process, in bytes.
/// Returns `None` on platforms where it cannot be detected.
pub fn available_memory() -> Option<u64> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return None;
    }
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    Some(sys.available_memory())
}
