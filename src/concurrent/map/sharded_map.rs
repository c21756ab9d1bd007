use std::borrow::Borrow;
use std::fmt::{self, Debug, Formatter};
use std::hash::{BuildHasher, Hash, RandomState};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::collections::contiguous::Array;
use crate::collections::hash::{HashMap, spread};

pub(crate) const DEFAULT_SHARDS: usize = 16;

/// A hash map shared across threads by partitioning its buckets into independently locked
/// shards.
///
/// A key's (spread) hash selects one of a fixed power-of-two number of shards, each an
/// [`RwLock`] around its own chained table. Writers touching different shards run fully in
/// parallel; readers share a shard's lock with each other and only ever wait out a same-shard
/// writer. Since a shard resizes privately under its own write lock, a reader always observes
/// one consistent table - the old or the new, never a torn mix.
///
/// Locking is per operation, so the map itself never hands out references into a shard: reads
/// either clone the value ([`get`](ShardedMap::get)) or run a closure against it while the lock
/// is held ([`with`](ShardedMap::with), [`update`](ShardedMap::update)).
///
/// Aggregates like [`len`](ShardedMap::len) sum per-shard counts without a global lock, so they
/// are only weakly consistent snapshots under concurrent mutation - matching the rest of the
/// crate's concurrent containers, which trade exact global counts for parallelism.
///
/// # Examples
/// ```
/// # use basic_collections::concurrent::ShardedMap;
/// let map = ShardedMap::<_, _>::new();
/// map.insert("a", 1);
/// assert_eq!(map.get(&"a"), Some(1));
/// assert_eq!(map.with(&"a", |v| v + 10), Some(11));
/// ```
pub struct ShardedMap<K: Hash + Eq, V, B: BuildHasher = RandomState> {
    shards: Array<RwLock<HashMap<K, V>>>,
    hasher: B,
    mask: usize,
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> ShardedMap<K, V, B> {
    /// Creates a map with the default shard count.
    pub fn new() -> ShardedMap<K, V, B> {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Creates a map with at least `shards` shards (rounded up to a power of two, at most 256).
    /// More shards means less write contention at the cost of memory; the count is fixed for the
    /// map's lifetime.
    pub fn with_shards(shards: usize) -> ShardedMap<K, V, B> {
        let count = shards.clamp(1, 256).next_power_of_two();
        ShardedMap {
            shards: Array::repeat_with(|| RwLock::new(HashMap::new()), count),
            hasher: B::default(),
            mask: count - 1,
        }
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> ShardedMap<K, V, B> {
    /// The number of shards the key space is partitioned into.
    pub const fn shard_count(&self) -> usize {
        self.mask + 1
    }

    /// Inserts the provided `key`-`value` pair, returning the previous value for the key if
    /// there was one. Blocks only same-shard operations while it runs.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.write_shard(self.shard_for(&key)).insert(key, value)
    }

    /// Returns a clone of the value associated with `key`. Cloning decouples the caller from the
    /// shard lock; use [`with`](ShardedMap::with) to avoid the clone.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.read_shard(self.shard_for(key)).get(key).cloned()
    }

    /// Runs `f` against the value associated with `key` while the shard's read lock is held,
    /// returning its result.
    pub fn with<Q, R>(&self, key: &Q, f: impl FnOnce(&V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read_shard(self.shard_for(key)).get(key).map(f)
    }

    /// Runs `f` against the value associated with `key` with exclusive access, returning its
    /// result.
    pub fn update<Q, R>(&self, key: &Q, f: impl FnOnce(&mut V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write_shard(self.shard_for(key)).get_mut(key).map(f)
    }

    /// Removes the entry associated with `key`, returning the value if it existed.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write_shard(self.shard_for(key)).remove(key)
    }

    /// Returns true if there is a value associated with the provided `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read_shard(self.shard_for(key)).contains(key)
    }

    /// The total entry count, summed shard by shard. Weakly consistent: concurrent writers can
    /// change shards already counted.
    pub fn len(&self) -> usize {
        (0..self.shard_count())
            .map(|shard| self.read_shard(shard).len())
            .sum()
    }

    /// Whether every shard was empty at the moment it was checked.
    pub fn is_empty(&self) -> bool {
        (0..self.shard_count()).all(|shard| self.read_shard(shard).is_empty())
    }

    /// Drops every entry, shard by shard. Concurrent writers may repopulate shards already
    /// cleared before the call returns.
    pub fn clear(&self) {
        for shard in 0..self.shard_count() {
            self.write_shard(shard).clear();
        }
    }

    /// Visits every entry under its shard's read lock. Entries inserted or removed concurrently
    /// in shards not yet visited may or may not be seen; entries untouched by writers are seen
    /// exactly once.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for shard in 0..self.shard_count() {
            for (key, value) in self.read_shard(shard).iter() {
                f(key, value);
            }
        }
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> ShardedMap<K, V, B> {
    fn shard_for<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        (spread(self.hasher.hash_one(key)) as usize) & self.mask
    }

    /// Lock poisoning only means another thread panicked mid-operation; the shard's table keeps
    /// its invariants between statements, so the state is recovered rather than propagating the
    /// panic.
    fn read_shard(&self, shard: usize) -> RwLockReadGuard<'_, HashMap<K, V>> {
        self.shards[shard].read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_shard(&self, shard: usize) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        self.shards[shard].write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> Default for ShardedMap<K, V, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Debug, V: Debug, B: BuildHasher> Debug for ShardedMap<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedMap")
            .field("shards", &self.shard_count())
            .field("len", &self.len())
            .finish()
    }
}
