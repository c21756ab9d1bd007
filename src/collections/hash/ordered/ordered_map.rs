use std::borrow::Borrow;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{BuildHasher, Hash, RandomState};
use std::mem;
use std::ptr::NonNull;

use super::Iter;
use crate::collections::contiguous::Array;
use crate::collections::hash::spread;

pub(crate) const DEFAULT_CAP: usize = 16;

pub(crate) type OrderedPtr<K, V> = NonNull<OrderedEntry<K, V>>;

/// An entry that participates in two lists at once: its bucket's collision chain (`next`) and
/// the map-wide insertion-order list (`ord_prev`/`ord_next`).
pub(crate) struct OrderedEntry<K, V> {
    pub hash: u64,
    pub key: K,
    pub value: V,
    pub next: Option<OrderedPtr<K, V>>,
    pub ord_prev: Option<OrderedPtr<K, V>>,
    pub ord_next: Option<OrderedPtr<K, V>>,
}

pub(crate) fn entry<'a, K, V>(ptr: OrderedPtr<K, V>) -> &'a OrderedEntry<K, V> {
    // SAFETY: An OrderedPtr always points at a live entry owned by its map; the unbounded
    // lifetime is constrained again by the APIs handing references out.
    unsafe { &*ptr.as_ptr() }
}

#[allow(clippy::mut_from_ref)]
pub(crate) fn entry_mut<'a, K, V>(ptr: OrderedPtr<K, V>) -> &'a mut OrderedEntry<K, V> {
    // SAFETY: As for entry; exclusivity is enforced by the borrow the caller holds on the owning
    // map.
    unsafe { &mut *ptr.as_ptr() }
}

/// A [`HashMap`](crate::collections::hash::HashMap) variant that additionally threads a doubly
/// linked list through all entries in insertion order, making iteration deterministic.
///
/// Re-inserting an existing key overwrites the value but keeps the key's original position.
/// Removal unlinks the entry from its bucket chain and the order list alike. Rehashing moves
/// entries between buckets but never touches the order links, so iteration order survives every
/// resize.
///
/// The ordered variant keeps its buckets as plain chains (no treeified bins): the order list
/// already costs two pointers per entry, and the intended use is deterministic iteration, not
/// adversarial hash loads.
pub struct OrderedHashMap<K: Hash + Eq, V, B: BuildHasher = RandomState> {
    pub(crate) buckets: Array<Option<OrderedPtr<K, V>>>,
    pub(crate) head: Option<OrderedPtr<K, V>>,
    pub(crate) tail: Option<OrderedPtr<K, V>>,
    pub(crate) len: usize,
    /// Structural modification count; see [`OrderedHashMap::iter`].
    pub(crate) mods: u64,
    pub(crate) hasher: B,
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> OrderedHashMap<K, V, B> {
    /// Creates a new OrderedHashMap with capacity 0 and the default value for `B`.
    pub fn new() -> OrderedHashMap<K, V, B> {
        Self::with_hasher(B::default())
    }

    /// Creates a new OrderedHashMap with at least the provided `cap`acity (rounded up to a power
    /// of two).
    pub fn with_cap(cap: usize) -> OrderedHashMap<K, V, B> {
        Self::with_cap_and_hasher(cap, B::default())
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> OrderedHashMap<K, V, B> {
    /// Creates a new OrderedHashMap with capacity 0 and the provided `hasher`.
    pub fn with_hasher(hasher: B) -> OrderedHashMap<K, V, B> {
        OrderedHashMap {
            buckets: Array::new(),
            head: None,
            tail: None,
            len: 0,
            mods: 0,
            hasher,
        }
    }

    /// Creates a new OrderedHashMap with at least the provided `cap`acity (rounded up to a power
    /// of two) and the provided `hasher`.
    pub fn with_cap_and_hasher(cap: usize, hasher: B) -> OrderedHashMap<K, V, B> {
        let cap = if cap == 0 { 0 } else { cap.next_power_of_two() };
        OrderedHashMap {
            buckets: Array::repeat_with(|| None, cap),
            head: None,
            tail: None,
            len: 0,
            mods: 0,
            hasher,
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn cap(&self) -> usize {
        self.buckets.size()
    }

    /// Inserts the provided `key`-`value` pair. If the key already exists, its value is
    /// overwritten, the previous value is returned, and the key keeps its position in the
    /// insertion order; a new key is appended at the back of the order.
    ///
    /// # Examples
    /// ```
    /// # use basic_collections::collections::contiguous::Vector;
    /// # use basic_collections::collections::hash::OrderedHashMap;
    /// let mut map = OrderedHashMap::<_, _>::new();
    /// map.insert("b", 1);
    /// map.insert("a", 2);
    /// map.insert("b", 3);
    /// let keys: Vector<_> = map.iter().map(|(k, _)| *k).collect();
    /// assert_eq!(&*keys, &["b", "a"], "Re-insertion must not move a key.");
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.cap() == 0 {
            self.resize(DEFAULT_CAP);
        }

        let hash = spread(self.hasher.hash_one(&key));
        let index = self.index_of(hash);

        // Scan the bucket chain for an equal key first.
        let mut curr = self.buckets[index];
        while let Some(ptr) = curr {
            let node = entry_mut(ptr);
            if node.hash == hash && node.key == key {
                return Some(mem::replace(&mut node.value, value));
            }
            curr = node.next;
        }

        let ptr = NonNull::from(Box::leak(Box::new(OrderedEntry {
            hash,
            key,
            value,
            // Chain order within a bucket carries no meaning here, so new entries go in at the
            // head.
            next: self.buckets[index],
            ord_prev: self.tail,
            ord_next: None,
        })));
        self.buckets[index] = Some(ptr);

        match self.tail {
            Some(old_tail) => entry_mut(old_tail).ord_next = Some(ptr),
            None => self.head = Some(ptr),
        }
        self.tail = Some(ptr);

        self.len += 1;
        self.mods += 1;

        if self.len > self.cap() * 3 / 4 {
            self.resize(self.cap() * 2);
        }
        None
    }

    /// Returns the entry for the provided `key` as a key-value pair, or None if there is no
    /// entry.
    pub fn get_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let node = entry(self.find(key)?);
        Some((&node.key, &node.value))
    }

    /// Returns a reference to the value associated with the provided `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_entry(key).map(|e| e.1)
    }

    /// Returns a mutable reference to the value associated with the provided `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let ptr = self.find(key)?;
        Some(&mut entry_mut(ptr).value)
    }

    /// Returns true if there is a value associated with the provided `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes the entry associated with `key`, unlinking it from both its bucket chain and the
    /// insertion order, and returns it if it exists.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.cap() == 0 {
            return None;
        }
        let hash = spread(self.hasher.hash_one(key));
        let index = self.index_of(hash);

        // Unlink from the bucket chain.
        let mut prev: Option<OrderedPtr<K, V>> = None;
        let mut curr = self.buckets[index];
        let found = loop {
            let ptr = curr?;
            let node = entry(ptr);
            if node.hash == hash && node.key.borrow() == key {
                match prev {
                    Some(prev) => entry_mut(prev).next = node.next,
                    None => self.buckets[index] = node.next,
                }
                break ptr;
            }
            prev = Some(ptr);
            curr = node.next;
        };

        self.unlink_order(found);
        self.len -= 1;
        self.mods += 1;

        // SAFETY: The entry is unlinked from chain and order list; this is its single
        // reclamation.
        let node = unsafe { *Box::from_raw(found.as_ptr()) };
        Some((node.key, node.value))
    }

    /// Removes the entry associated with `key`, returning the value if it exists.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|e| e.1)
    }

    /// The oldest entry (first inserted among those still present).
    pub fn front(&self) -> Option<(&K, &V)> {
        let node = entry(self.head?);
        Some((&node.key, &node.value))
    }

    /// The newest entry.
    pub fn back(&self) -> Option<(&K, &V)> {
        let node = entry(self.tail?);
        Some((&node.key, &node.value))
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let ptr = self.head?;
        let hash = entry(ptr).hash;
        let index = self.index_of(hash);

        // Unlink from the bucket chain.
        let mut prev: Option<OrderedPtr<K, V>> = None;
        let mut curr = self.buckets[index];
        while let Some(chain_ptr) = curr {
            if chain_ptr == ptr {
                match prev {
                    Some(prev) => entry_mut(prev).next = entry(ptr).next,
                    None => self.buckets[index] = entry(ptr).next,
                }
                break;
            }
            prev = Some(chain_ptr);
            curr = entry(chain_ptr).next;
        }

        self.unlink_order(ptr);
        self.len -= 1;
        self.mods += 1;

        // SAFETY: The entry is unlinked from chain and order list; this is its single
        // reclamation.
        let node = unsafe { *Box::from_raw(ptr.as_ptr()) };
        Some((node.key, node.value))
    }

    /// Drops every entry, keeping the bucket array for reuse.
    pub fn clear(&mut self) {
        self.mods += 1;
        self.len = 0;

        let mut curr = self.head.take();
        self.tail = None;
        while let Some(ptr) = curr {
            // SAFETY: Walking the order list visits every entry exactly once.
            let node = unsafe { Box::from_raw(ptr.as_ptr()) };
            curr = node.ord_next;
        }

        for bucket in self.buckets.iter_mut() {
            *bucket = None;
        }
    }

    /// Returns an iterator over all key-value pairs in insertion order.
    ///
    /// The iterator snapshots the map's structural modification counter and checks it on every
    /// step; the borrow rules make a genuine violation unrepresentable in safe code, so the check
    /// is a debug assertion documenting the fail-fast contract.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.into_iter()
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> OrderedHashMap<K, V, B> {
    pub(crate) fn index_of(&self, hash: u64) -> usize {
        debug_assert!(self.cap().is_power_of_two());
        (hash as usize) & (self.cap() - 1)
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Option<OrderedPtr<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.cap() == 0 {
            return None;
        }
        let hash = spread(self.hasher.hash_one(key));
        let mut curr = self.buckets[self.index_of(hash)];
        while let Some(ptr) = curr {
            let node = entry(ptr);
            if node.hash == hash && node.key.borrow() == key {
                return Some(ptr);
            }
            curr = node.next;
        }
        None
    }

    fn unlink_order(&mut self, ptr: OrderedPtr<K, V>) {
        let node = entry(ptr);
        match node.ord_prev {
            Some(prev) => entry_mut(prev).ord_next = node.ord_next,
            None => self.head = node.ord_next,
        }
        match node.ord_next {
            Some(next) => entry_mut(next).ord_prev = node.ord_prev,
            None => self.tail = node.ord_prev,
        }
    }

    /// Rebuilds the bucket array at `new_cap`. Only chain links change; the order list is
    /// untouched, so iteration order survives.
    pub(crate) fn resize(&mut self, new_cap: usize) {
        debug_assert!(new_cap.is_power_of_two());
        self.buckets = Array::repeat_with(|| None, new_cap);
        self.mods += 1;

        let mask = (new_cap - 1) as u64;
        let mut curr = self.head;
        while let Some(ptr) = curr {
            let node = entry_mut(ptr);
            let index = (node.hash & mask) as usize;
            node.next = self.buckets[index];
            self.buckets[index] = Some(ptr);
            curr = node.ord_next;
        }
    }
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> Default for OrderedHashMap<K, V, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> FromIterator<(K, V)> for OrderedHashMap<K, V, B> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedHashMap::new();
        for (key, value) in iter.into_iter() {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> Extend<(K, V)> for OrderedHashMap<K, V, B> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter.into_iter() {
            self.insert(key, value);
        }
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> Drop for OrderedHashMap<K, V, B> {
    fn drop(&mut self) {
        let mut curr = self.head;
        while let Some(ptr) = curr {
            // SAFETY: Walking the order list visits every entry exactly once; nothing reads the
            // buckets afterwards.
            let node = unsafe { Box::from_raw(ptr.as_ptr()) };
            curr = node.ord_next;
        }
    }
}

// SAFETY: An OrderedHashMap owns its entries through unique pointers with no sharing, so sending
// the map sends the keys and values.
unsafe impl<K: Hash + Eq + Send, V: Send, B: BuildHasher + Send> Send for OrderedHashMap<K, V, B> {}
// SAFETY: The safe API offers no interior mutability, so shared references only permit reads.
unsafe impl<K: Hash + Eq + Sync, V: Sync, B: BuildHasher + Sync> Sync for OrderedHashMap<K, V, B> {}

impl<K: Hash + Eq + Debug, V: Debug, B: BuildHasher> Debug for OrderedHashMap<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq + Debug, V: Debug, B: BuildHasher> Display for OrderedHashMap<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#")?;
        f.debug_map().entries(self.iter()).finish()
    }
}
