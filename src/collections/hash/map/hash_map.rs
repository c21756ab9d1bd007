use std::borrow::Borrow;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{BuildHasher, Hash, RandomState};
use std::mem;

use super::bucket::{self, Bucket, BucketInsert};
use super::{IntoKeys, IntoValues, Iter, IterMut, Keys, Values, ValuesMut};
use crate::collections::contiguous::Array;

/// First allocated capacity. Like every later capacity, a power of two, so the bucket index is a
/// mask of the spread hash.
pub(crate) const DEFAULT_CAP: usize = 16;

/// Resize when `len > cap * 3 / 4`.
pub(crate) const LOAD_FACTOR_NUMERATOR: usize = 3;
pub(crate) const LOAD_FACTOR_DENOMINATOR: usize = 4;

/// A chain reaching this length is reorganized into a balanced bin, provided the table holds at
/// least [`MIN_TREEIFY_CAPACITY`] buckets (a small table grows instead - spreading entries out is
/// cheaper than balancing them).
pub(crate) const TREEIFY_THRESHOLD: usize = 8;

/// A bin that shrinks to this many entries collapses back into a chain.
pub(crate) const UNTREEIFY_THRESHOLD: usize = 6;

pub(crate) const MIN_TREEIFY_CAPACITY: usize = 64;

/// A map of keys to values which relies on the keys implementing [`Hash`], resolving collisions
/// by chaining.
///
/// It is a logic error for keys in a HashMap to be manipulated in a way that changes their hash.
/// Because of this, HashMap's API prevents mutable access to its keys.
///
/// # Collision handling
/// Each bucket holds a linked chain of `(hash, key, value)` entries; an insertion scans its chain
/// for an equal key to overwrite and appends otherwise. The hash is spread (high bits folded into
/// low) before masking, so a [`BuildHasher`] whose low bits cluster still disperses. When
/// `len > cap * 3/4` the table doubles: every entry keeps its cached hash, and each chain splits
/// in place by the new high bit into a "low" chain (same index) and "high" chain (index plus the
/// old capacity), preserving relative order within each half. A chain that still manages to reach
/// [`TREEIFY_THRESHOLD`] entries on a table of at least [`MIN_TREEIFY_CAPACITY`] buckets is
/// reorganized into a red-black bin, bounding that bucket's lookups at `O(log n)`.
///
/// # Time Complexity
/// For this analysis of time complexity, variables are defined as follows:
/// - `n`: The number of entries in the HashMap.
///
/// | Method | Complexity |
/// |-|-|
/// | `len` | `O(1)` |
/// | `insert` | `O(1)`*, `O(n)` on resize |
/// | `get` | `O(1)`* |
/// | `remove` | `O(1)`* |
/// | `contains` | `O(1)`* |
/// | `reserve` | `O(n)`**, `O(1)` |
///
/// \* Average case. A colliding bucket costs its chain length, or `O(log n)` once treeified.
///
/// \** If the HashMap already has enough capacity for the additional items, `reserve` is `O(1)`.
pub struct HashMap<K: Hash + Eq, V, B: BuildHasher = RandomState> {
    pub(crate) buckets: Array<Bucket<K, V>>,
    pub(crate) len: usize,
    /// Structural modification count; see [`HashMap::iter`].
    pub(crate) mods: u64,
    pub(crate) hasher: B,
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> HashMap<K, V, B> {
    /// Creates a new HashMap with capacity 0 and the default value for `B`. Buckets are allocated
    /// on first insertion.
    pub fn new() -> HashMap<K, V, B> {
        HashMap {
            buckets: Array::new(),
            len: 0,
            mods: 0,
            hasher: B::default(),
        }
    }

    /// Creates a new HashMap with at least the provided `cap`acity (rounded up to a power of
    /// two), allowing insertions without reallocation. The default hasher will be used.
    pub fn with_cap(cap: usize) -> HashMap<K, V, B> {
        Self::with_cap_and_hasher(cap, B::default())
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> HashMap<K, V, B> {
    /// Creates a new HashMap with capacity 0 and the provided `hasher`.
    pub fn with_hasher(hasher: B) -> HashMap<K, V, B> {
        HashMap {
            buckets: Array::new(),
            len: 0,
            mods: 0,
            hasher,
        }
    }

    /// Creates a new HashMap with at least the provided `cap`acity (rounded up to a power of
    /// two) and the provided `hasher`.
    pub fn with_cap_and_hasher(cap: usize, hasher: B) -> HashMap<K, V, B> {
        let cap = if cap == 0 { 0 } else { cap.next_power_of_two() };
        HashMap {
            buckets: Array::repeat_with(|| Bucket::Empty, cap),
            len: 0,
            mods: 0,
            hasher,
        }
    }

    /// Returns the length of the HashMap.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the HashMap contains no entries.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current capacity (bucket count) of the HashMap.
    pub const fn cap(&self) -> usize {
        self.buckets.size()
    }

    /// Inserts the provided `key`-`value` pair into the HashMap, growing if the load factor would
    /// be exceeded. If the key was already associated with a value, the previous value is
    /// returned.
    ///
    /// As with the standard library, the key isn't changed if it already exists.
    ///
    /// # Examples
    /// ```
    /// # use basic_collections::collections::hash::HashMap;
    /// let mut map = HashMap::<_, _>::new();
    /// assert_eq!(map.insert("a", 1), None);
    /// assert_eq!(map.insert("a", 2), Some(1));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.cap() == 0 {
            self.resize(DEFAULT_CAP);
        }

        let hash = self.hash_key(&key);
        let index = self.index_of(hash);

        match self.buckets[index].insert(hash, key, value) {
            BucketInsert::Replaced(old) => Some(old),
            BucketInsert::Added { chain_len } => {
                self.len += 1;
                self.mods += 1;

                if chain_len >= TREEIFY_THRESHOLD {
                    if self.cap() < MIN_TREEIFY_CAPACITY {
                        self.resize(self.cap() * 2);
                    } else {
                        self.treeify(index);
                    }
                }
                if self.len > self.cap() * LOAD_FACTOR_NUMERATOR / LOAD_FACTOR_DENOMINATOR {
                    self.resize(self.cap() * 2);
                }
                None
            },
        }
    }

    /// Returns the entry for the provided `key` as a key-value pair, or None if there is no
    /// entry.
    pub fn get_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        // Q is a borrowed form of K whose equality and hashing carry over the borrow.
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let ptr = self.find(key)?;
        let node = bucket::entry(ptr);
        Some((&node.key, &node.value))
    }

    /// Returns a reference to the value associated with the provided `key`, or None if the map
    /// contains no value for it.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_entry(key).map(|e| e.1)
    }

    /// Returns a mutable reference to the value associated with the provided `key`, or None if
    /// the map contains no value for it.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let ptr = self.find(key)?;
        Some(&mut bucket::entry_mut(ptr).value)
    }

    /// Removes the entry associated with `key`, returning it if it exists.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.cap() == 0 {
            return None;
        }

        let hash = self.hash_key(key);
        let index = self.index_of(hash);

        let removed = self.buckets[index].remove(hash, key)?;
        self.len -= 1;
        self.mods += 1;

        // A bin that has shrunk far enough reads faster as a plain chain again.
        let collapsed =
            matches!(&self.buckets[index], Bucket::Tree(tb) if tb.len <= UNTREEIFY_THRESHOLD);
        if collapsed {
            self.untreeify(index);
        }

        Some(removed)
    }

    /// Removes the entry associated with `key`, returning the value if it exists.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|e| e.1)
    }

    /// Returns true if there is a value associated with the provided `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Grows the HashMap so that len + `extra` entries fit without exceeding the load factor.
    pub fn reserve(&mut self, extra: usize) {
        let needed = self.len.checked_add(extra).expect("Capacity overflow!");
        let target = needed
            .checked_mul(LOAD_FACTOR_DENOMINATOR)
            .expect("Capacity overflow!")
            / LOAD_FACTOR_NUMERATOR
            + 1;
        let new_cap = target.next_power_of_two().max(DEFAULT_CAP);

        if new_cap > self.cap() {
            self.resize(new_cap);
        }
    }

    /// Drops every entry, keeping the bucket array for reuse.
    pub fn clear(&mut self) {
        self.mods += 1;
        self.len = 0;
        for bucket in self.buckets.iter_mut() {
            bucket.clear_entries();
        }
    }

    /// Returns an iterator over all key-value pairs, in arbitrary bucket order.
    ///
    /// The iterator snapshots the map's structural modification counter and checks it on every
    /// step; the borrow rules make a genuine violation unrepresentable in safe code, so the check
    /// is a debug assertion documenting the fail-fast contract.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.into_iter()
    }

    /// Returns an iterator over all key-value pairs with mutable access to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.into_iter()
    }

    /// Consumes self and returns an iterator over all contained keys.
    pub fn into_keys(self) -> IntoKeys<K, V, B> {
        IntoKeys(self.into_iter())
    }

    /// Returns an iterator over all keys, as references.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Consumes self and returns an iterator over all contained values.
    pub fn into_values(self) -> IntoValues<K, V, B> {
        IntoValues(self.into_iter())
    }

    /// Returns an iterator over all values, as references.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Returns an iterator over all values, as mutable references.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut(self.iter_mut())
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> HashMap<K, V, B> {
    pub(crate) fn hash_key<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        crate::collections::hash::spread(self.hasher.hash_one(key))
    }

    /// The bucket index for an already-spread hash. The capacity is always a power of two, so
    /// masking is equivalent to (and cheaper than) a remainder.
    pub(crate) fn index_of(&self, hash: u64) -> usize {
        debug_assert!(self.cap().is_power_of_two());
        (hash as usize) & (self.cap() - 1)
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Option<bucket::EntryPtr<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.cap() == 0 {
            return None;
        }
        let hash = self.hash_key(key);
        self.buckets[self.index_of(hash)].find(hash, key)
    }

    /// Rebuilds the table at `new_cap` buckets. Every entry keeps its cached hash; chains are
    /// split across their destination buckets in place and in order, and any destination chain
    /// long enough on the larger table is reorganized into a bin.
    pub(crate) fn resize(&mut self, new_cap: usize) {
        debug_assert!(new_cap.is_power_of_two() && new_cap >= self.cap());
        self.mods += 1;

        let old = mem::replace(
            &mut self.buckets,
            Array::repeat_with(|| Bucket::Empty, new_cap),
        );

        // Tail pointers let each destination chain grow at the back, preserving relative order.
        let mut tails: Array<Option<bucket::EntryPtr<K, V>>> =
            Array::repeat_with(|| None, new_cap);
        let mask = (new_cap - 1) as u64;
        let buckets = &mut self.buckets;

        for old_bucket in old.into_iter() {
            bucket::drain_bucket(old_bucket, |ptr| {
                let node = bucket::entry_mut(ptr);
                node.next = None;
                let index = (node.hash & mask) as usize;

                match tails[index] {
                    Some(tail) => {
                        bucket::entry_mut(tail).next = Some(ptr);
                        match &mut buckets[index] {
                            Bucket::Chain(chain) => chain.len += 1,
                            // UNREACHABLE: Destination buckets are built as chains here.
                            _ => unreachable!(),
                        }
                    },
                    None => {
                        buckets[index] = Bucket::Chain(bucket::Chain { head: ptr, len: 1 });
                    },
                }
                tails[index] = Some(ptr);
            });
        }

        if new_cap >= MIN_TREEIFY_CAPACITY {
            for index in 0..new_cap {
                if self.buckets[index].len() >= TREEIFY_THRESHOLD {
                    self.treeify(index);
                }
            }
        }
    }

    pub(crate) fn treeify(&mut self, index: usize) {
        let bucket = mem::replace(&mut self.buckets[index], Bucket::Empty);
        self.buckets[index] = match bucket {
            Bucket::Chain(chain) => Bucket::Tree(bucket::treeify_chain(chain)),
            other => other,
        };
    }

    pub(crate) fn untreeify(&mut self, index: usize) {
        let bucket = mem::replace(&mut self.buckets[index], Bucket::Empty);
        self.buckets[index] = match bucket {
            Bucket::Tree(tb) => bucket::untreeify_bin(tb),
            other => other,
        };
    }
}

impl<K: Hash + Eq, V> Default for HashMap<K, V> {
    fn default() -> Self {
        HashMap::new()
    }
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> FromIterator<(K, V)> for HashMap<K, V, B> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HashMap::new();
        for (key, value) in iter.into_iter() {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> Extend<(K, V)> for HashMap<K, V, B> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter.into_iter() {
            self.insert(key, value);
        }
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> Drop for HashMap<K, V, B> {
    fn drop(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.clear_entries();
        }
    }
}

// SAFETY: A HashMap owns its entries through unique pointers with no sharing, so sending the map
// sends the keys and values.
unsafe impl<K: Hash + Eq + Send, V: Send, B: BuildHasher + Send> Send for HashMap<K, V, B> {}
// SAFETY: The safe API offers no interior mutability, so shared references only permit reads.
unsafe impl<K: Hash + Eq + Sync, V: Sync, B: BuildHasher + Sync> Sync for HashMap<K, V, B> {}

impl<K: Hash + Eq + Debug, V: Debug, B: BuildHasher> Debug for HashMap<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq + Debug, V: Debug, B: BuildHasher> Display for HashMap<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#")?;
        f.debug_map().entries(self.iter()).finish()
    }
}
