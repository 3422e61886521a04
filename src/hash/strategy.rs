use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

/// Supplies the hash and the initial value for keys in a `GrowHash`.
///
/// The strategy is given to the table once, at construction. `hash` is reduced modulo the
/// bucket count to pick a chain. `init` is called exactly once for every newly created entry.
pub trait HashStrategy<K, V> {
    fn hash(&self, key: &K) -> u16;

    fn init(&self, key: &K) -> V;
}

/// Hashes the raw bytes of a plain-old-data key, and starts values at their `Default`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteHash;

impl<K: Pod, V: Default> HashStrategy<K, V> for ByteHash {
    fn hash(&self, key: &K) -> u16 {
        hash_bytes(bytemuck::bytes_of(key))
    }

    fn init(&self, _key: &K) -> V {
        V::default()
    }
}

/// 32-bit FNV-1a, folded to 16 bits
pub fn hash_bytes(bytes: &[u8]) -> u16 {
    const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let hash = bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
    });
    ((hash >> 16) ^ (hash & 0xffff)) as u16
}

/// A strategy built from two plain functions.
pub struct FnStrategy<K, V> {
    hash: fn(&K) -> u16,
    init: fn(&K) -> V,
    phantom: PhantomData<fn(&K) -> V>,
}

impl<K, V> FnStrategy<K, V> {
    pub const fn new(hash: fn(&K) -> u16, init: fn(&K) -> V) -> Self {
        FnStrategy {
            hash,
            init,
            phantom: PhantomData,
        }
    }
}

impl<K, V> Clone for FnStrategy<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for FnStrategy<K, V> {}

impl<K, V> fmt::Debug for FnStrategy<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").finish_non_exhaustive()
    }
}

impl<K, V> HashStrategy<K, V> for FnStrategy<K, V> {
    fn hash(&self, key: &K) -> u16 {
        (self.hash)(key)
    }

    fn init(&self, key: &K) -> V {
        (self.init)(key)
    }
}

#[test]
fn hash_bytes_differs_on_single_bit_test() {
    let a = [0u8; 24];
    let mut b = a;
    b[17] = 1;
    assert_ne!(hash_bytes(&a), hash_bytes(&b));
    assert_eq!(hash_bytes(&a), hash_bytes(&[0u8; 24]));
}
