use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use bytemuck::Zeroable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::hash::{
    ByteHash, FnStrategy, GrowHash, GrowHashError, GrowHashSettings, HashStrategy, TeardownStats,
};
use crate::position::{Direction, Move, Orientation, Position, PositionInfo};
use crate::tests::positions_after_moves;

fn identity_hash(key: &u32) -> u16 {
    *key as u16
}

fn triple(key: &u32) -> u64 {
    *key as u64 * 3
}

const IDENTITY: FnStrategy<u32, u64> = FnStrategy::new(identity_hash, triple);

fn small_table(bucket_count: usize, block_size: u32) -> GrowHash<u32, u64, FnStrategy<u32, u64>> {
    let settings = GrowHashSettings::default()
        .bucket_count(bucket_count)
        .initial_block_size(block_size)
        .block_grow_size(block_size);
    GrowHash::with_settings(IDENTITY, settings).unwrap()
}

/// Counts how often values are initialized
#[derive(Default)]
struct CountingStrategy {
    inits: Cell<usize>,
}

impl HashStrategy<u32, u64> for CountingStrategy {
    fn hash(&self, key: &u32) -> u16 {
        (*key % 7) as u16
    }

    fn init(&self, key: &u32) -> u64 {
        self.inits.set(self.inits.get() + 1);
        *key as u64
    }
}

#[test]
fn add_then_get_test() {
    let mut table = small_table(64, 16);
    *table.add(&5).unwrap() += 1;

    assert_eq!(table.get(&5), Some(&16));
    assert_eq!(table.get(&6), None);
    assert_eq!(table.len(), 1);
}

#[test]
fn add_existing_key_returns_same_value_test() {
    let mut table = small_table(64, 16);
    let first = table.add(&42).unwrap() as *mut u64;
    let second = table.add(&42).unwrap() as *mut u64;

    assert_eq!(first, second);
    assert_eq!(table.len(), 1);
    assert_eq!(table.iter().count(), 1);
}

#[test]
fn init_only_called_for_new_entries_test() {
    let mut table: GrowHash<u32, u64, _> = GrowHash::new(CountingStrategy::default()).unwrap();
    for key in 0..100 {
        table.add(&key).unwrap();
    }
    for key in 0..100 {
        table.add(&key).unwrap();
        table.get(&key).unwrap();
    }
    assert_eq!(table.strategy().inits.get(), 100);

    table.remove(&10);
    table.add(&10).unwrap();
    assert_eq!(table.strategy().inits.get(), 101);
}

#[test]
fn remove_then_get_test() {
    let mut table = small_table(64, 16);
    table.add(&7).unwrap();

    assert!(table.remove(&7));
    assert_eq!(table.get(&7), None);
    assert!(table.is_empty());
}

#[test]
fn double_remove_test() {
    let mut table = small_table(64, 16);
    table.add(&7).unwrap();

    assert!(table.remove(&7));
    assert!(!table.remove(&7));
    assert!(!table.remove(&8));
    assert_eq!(table.len(), 0);
}

#[test]
fn distinct_keys_get_distinct_values_test() {
    // Few buckets, so most keys share a chain
    let mut table = small_table(3, 8);
    for key in 0..200 {
        table.add(&key).unwrap();
    }
    let addresses: HashSet<*const u64> = (0..200)
        .map(|key| table.get(&key).unwrap() as *const u64)
        .collect();
    assert_eq!(addresses.len(), 200);
}

#[test]
fn values_do_not_move_when_table_grows_test() {
    let mut table = small_table(16, 32);
    let mut addresses = vec![];
    for key in 0..32 {
        let value = table.add(&key).unwrap();
        *value += 1;
        addresses.push(value as *const u64);
    }
    assert_eq!(table.block_count(), 1);

    for key in 32..500 {
        table.add(&key).unwrap();
    }
    assert!(table.block_count() > 1);

    for key in 0..32 {
        let value = table.get(&key).unwrap();
        assert_eq!(value as *const u64, addresses[key as usize]);
        assert_eq!(*value, key as u64 * 3 + 1);
    }
}

#[test]
fn removed_slot_is_reused_test() {
    let mut table = small_table(16, 8);
    for key in 0..8 {
        table.add(&key).unwrap();
    }
    assert_eq!(table.block_count(), 1);
    assert_eq!(table.capacity(), 8);

    assert!(table.remove(&3));
    assert_eq!(table.free_slots(), 1);
    table.add(&100).unwrap();

    assert_eq!(table.block_count(), 1);
    assert_eq!(table.free_slots(), 0);
    assert_eq!(table.get(&100), Some(&300));
    assert_eq!(table.get(&3), None);
}

#[test]
fn colliding_keys_relink_after_middle_removal_test() {
    let mut table = small_table(4, 8);
    // 2, 6 and 10 all land in bucket 2
    for key in [2, 6, 10] {
        table.add(&key).unwrap();
    }
    assert_eq!(table.longest_chain(), 3);

    assert!(table.remove(&6));
    assert_eq!(table.longest_chain(), 2);
    assert_eq!(table.get(&2), Some(&6));
    assert_eq!(table.get(&6), None);
    assert_eq!(table.get(&10), Some(&30));

    // Chain head, then chain tail
    assert!(table.remove(&10));
    assert_eq!(table.get(&2), Some(&6));
    assert!(table.remove(&2));
    assert_eq!(table.longest_chain(), 0);
    assert!(table.is_empty());
}

#[test]
fn matches_std_hashmap_test() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut table = small_table(16, 32);
    let mut model: HashMap<u32, u64> = HashMap::new();

    for _ in 0..20_000 {
        let key = rng.gen_range(0..500);
        match rng.gen_range(0..4) {
            0 | 1 => {
                let value = table.add(&key).unwrap();
                let expected = model.entry(key).or_insert(key as u64 * 3);
                assert_eq!(value, expected);
                *value += 1;
                *expected += 1;
            }
            2 => assert_eq!(table.remove(&key), model.remove(&key).is_some()),
            _ => assert_eq!(table.get(&key), model.get(&key)),
        }
        assert_eq!(table.len(), model.len());
    }

    let mut entries: Vec<(u32, u64)> = table.iter().map(|(k, v)| (*k, *v)).collect();
    let mut expected: Vec<(u32, u64)> = model.into_iter().collect();
    entries.sort_unstable();
    expected.sort_unstable();
    assert_eq!(entries, expected);
}

#[test]
fn destroy_releases_blocks_test() {
    let mut table = GrowHash::<u32, u64, _>::new(IDENTITY).unwrap();
    for key in 0..5000 {
        table.add(&key).unwrap();
    }
    // Default blocks hold 1024 slots
    assert_eq!(table.block_count(), 5);
    assert_eq!(
        table.destroy(),
        TeardownStats {
            blocks: 5,
            elements: 5000
        }
    );
    assert!(!std::mem::needs_drop::<PositionInfo>());
}

struct SharedInit(Rc<()>);

impl HashStrategy<u32, Rc<()>> for SharedInit {
    fn hash(&self, key: &u32) -> u16 {
        *key as u16
    }

    fn init(&self, _key: &u32) -> Rc<()> {
        self.0.clone()
    }
}

#[test]
fn destroy_drops_owned_values_test() {
    let shared = Rc::new(());
    let mut table: GrowHash<u32, Rc<()>, _> = GrowHash::new(SharedInit(shared.clone())).unwrap();
    for key in 0..10 {
        table.add(&key).unwrap();
    }
    table.remove(&0);
    assert_eq!(Rc::strong_count(&shared), 12);

    table.destroy();
    assert_eq!(Rc::strong_count(&shared), 1);
}

#[test]
fn invalid_settings_test() {
    let invalid = [
        GrowHashSettings::default().bucket_count(0),
        GrowHashSettings::default().bucket_count(70_000),
        GrowHashSettings::default().initial_block_size(0),
        GrowHashSettings::default().block_grow_size(0),
    ];
    for settings in invalid {
        assert!(matches!(
            GrowHash::with_settings(IDENTITY, settings),
            Err(GrowHashError::InvalidSettings(_))
        ));
    }
}

#[test]
fn mem_usage_setting_test() {
    let settings = GrowHashSettings::default().mem_usage::<u32, u64>(0);
    assert_eq!(settings.get_bucket_count(), 1);

    let settings = GrowHashSettings::default().mem_usage::<u32, u64>(usize::MAX);
    assert_eq!(settings.get_bucket_count(), crate::hash::MAX_BUCKETS);
}

#[test]
fn positions_with_default_hash_test() {
    let moves = [
        Move::step(Direction::Up),
        Move::step(Direction::Down),
        Move::wall(Orientation::Row, 3, 3),
        Move::step(Direction::Left),
        Move::step(Direction::Right),
        Move::wall(Orientation::Column, 5, 0),
        Move::pawn(1, 1),
    ];
    let positions = positions_after_moves(&moves);

    let mut table: GrowHash<Position, PositionInfo> = GrowHash::new(ByteHash).unwrap();
    for (i, position) in positions.iter().enumerate() {
        table.add(position).unwrap().set_evaluated(i as f32);
    }
    assert_eq!(table.len(), positions.len());
    for (i, position) in positions.iter().enumerate() {
        let info = table.get(position).unwrap();
        assert_eq!(info.score, i as f32);
        assert!(info.is_computed());
    }
    assert!(table.get(&Zeroable::zeroed()).is_none());
}
