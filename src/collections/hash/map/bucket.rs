use std::borrow::Borrow;
use std::mem;
use std::ptr::NonNull;

use crate::collections::tree::rb::{NIL, RbTree};
use crate::util::ext::OptionExtension;

/// A single key-value entry in a collision chain. Entries are individually heap-allocated and
/// linked through `next`; the full (already spread) hash is cached so resizes and tree bins never
/// rehash a key.
pub(crate) struct Entry<K, V> {
    pub hash: u64,
    pub key: K,
    pub value: V,
    pub next: Option<EntryPtr<K, V>>,
}

pub(crate) type EntryPtr<K, V> = NonNull<Entry<K, V>>;

pub(crate) fn alloc_entry<K, V>(hash: u64, key: K, value: V) -> EntryPtr<K, V> {
    NonNull::from(Box::leak(Box::new(Entry {
        hash,
        key,
        value,
        next: None,
    })))
}

/// Reclaims an unlinked entry from the heap, transferring ownership of its key and value.
pub(crate) fn free_entry<K, V>(ptr: EntryPtr<K, V>) -> Entry<K, V> {
    // SAFETY: Entries are allocated by alloc_entry and freed exactly once, after being unlinked
    // from every chain.
    unsafe { *Box::from_raw(ptr.as_ptr()) }
}

pub(crate) fn entry<'a, K, V>(ptr: EntryPtr<K, V>) -> &'a Entry<K, V> {
    // SAFETY: An EntryPtr always points at a live entry owned by its table; the unbounded
    // lifetime is constrained again by the APIs handing references out.
    unsafe { &*ptr.as_ptr() }
}

#[allow(clippy::mut_from_ref)]
pub(crate) fn entry_mut<'a, K, V>(ptr: EntryPtr<K, V>) -> &'a mut Entry<K, V> {
    // SAFETY: As for entry; exclusivity is enforced by the borrow the caller holds on the owning
    // table.
    unsafe { &mut *ptr.as_ptr() }
}

/// One slot of the table. A bucket starts empty, holds a linked chain while short, and is
/// reorganized into a red-black bin keyed by full hash once the chain passes the treeify
/// threshold (see the map-level constants).
pub(crate) enum Bucket<K, V> {
    Empty,
    Chain(Chain<K, V>),
    Tree(TreeBin<K, V>),
}

pub(crate) struct Chain<K, V> {
    pub head: EntryPtr<K, V>,
    pub len: usize,
}

/// A balanced bucket: a red-black tree over full hash values, where each tree node holds the
/// chain of Eq-distinct entries sharing that exact hash. Lookup descends the tree in
/// `O(log n)` and finishes along a (normally single-entry) chain.
pub(crate) struct TreeBin<K, V> {
    pub bin: RbTree<u64, SameHash<K, V>>,
    pub len: usize,
}

/// Head of the chain of entries sharing one full hash value.
pub(crate) struct SameHash<K, V>(pub EntryPtr<K, V>);

/// The outcome of a bucket insertion, as seen by the owning map.
pub(crate) enum BucketInsert<V> {
    /// An equal key existed; its value was overwritten.
    Replaced(V),
    /// A new entry was linked in. `chain_len` is the resulting chain length for plain chains
    /// (0 for tree bins), which the map uses for its treeify decision.
    Added { chain_len: usize },
}

impl<K, V> Bucket<K, V> {
    /// The number of entries held, over all shapes.
    pub fn len(&self) -> usize {
        match self {
            Bucket::Empty => 0,
            Bucket::Chain(chain) => chain.len,
            Bucket::Tree(tb) => tb.len,
        }
    }

    /// Finds the entry matching `hash` and `key`.
    pub fn find<Q>(&self, hash: u64, key: &Q) -> Option<EntryPtr<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            Bucket::Empty => None,
            Bucket::Chain(chain) => find_in_chain(Some(chain.head), hash, key),
            Bucket::Tree(tb) => {
                let same = tb.bin.get(&hash)?;
                find_in_chain(Some(same.0), hash, key)
            },
        }
    }

    /// Inserts or overwrites, per the table's contract: scan for an equal key first, append (or
    /// link into the bin) otherwise.
    pub fn insert(&mut self, hash: u64, key: K, value: V) -> BucketInsert<V>
    where
        K: Eq,
    {
        match self {
            Bucket::Empty => {
                *self = Bucket::Chain(Chain {
                    head: alloc_entry(hash, key, value),
                    len: 1,
                });
                BucketInsert::Added { chain_len: 1 }
            },
            Bucket::Chain(chain) => {
                let mut curr = chain.head;
                loop {
                    let node = entry_mut(curr);
                    if node.hash == hash && node.key == key {
                        return BucketInsert::Replaced(mem::replace(&mut node.value, value));
                    }
                    match node.next {
                        Some(next) => curr = next,
                        None => {
                            // Append at the tail so chain order stays insertion order.
                            node.next = Some(alloc_entry(hash, key, value));
                            chain.len += 1;
                            return BucketInsert::Added { chain_len: chain.len };
                        },
                    }
                }
            },
            Bucket::Tree(tb) => {
                match tb.bin.get_mut(&hash) {
                    Some(same) => {
                        let mut curr = same.0;
                        loop {
                            let node = entry_mut(curr);
                            if node.key == key {
                                return BucketInsert::Replaced(
                                    mem::replace(&mut node.value, value)
                                );
                            }
                            match node.next {
                                Some(next) => curr = next,
                                None => {
                                    node.next = Some(alloc_entry(hash, key, value));
                                    break;
                                },
                            }
                        }
                    },
                    None => {
                        tb.bin.insert(hash, SameHash(alloc_entry(hash, key, value)));
                    },
                }
                tb.len += 1;
                BucketInsert::Added { chain_len: 0 }
            },
        }
    }

    /// Unlinks and reclaims the entry matching `hash` and `key`, returning its key and value.
    /// An emptied bucket reverts to [`Bucket::Empty`].
    pub fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            Bucket::Empty => None,
            Bucket::Chain(chain) => {
                let removed = unlink_from_chain(&mut chain.head, hash, key)?;
                chain.len -= 1;
                if chain.len == 0 {
                    *self = Bucket::Empty;
                }
                let node = free_entry(removed);
                Some((node.key, node.value))
            },
            Bucket::Tree(tb) => {
                let same = tb.bin.get_mut(&hash)?;
                let mut head = Some(same.0);
                let removed = unlink_from_chain_opt(&mut head, hash, key)?;
                match head {
                    Some(new_head) => same.0 = new_head,
                    // Last entry for this hash: drop the tree node as well.
                    None => {
                        tb.bin.remove(&hash);
                    },
                }
                tb.len -= 1;
                if tb.len == 0 {
                    *self = Bucket::Empty;
                }
                let node = free_entry(removed);
                Some((node.key, node.value))
            },
        }
    }

    /// Unlinks and reclaims an arbitrary entry; used for owned iteration and teardown. An
    /// emptied bucket reverts to [`Bucket::Empty`].
    pub fn pop_entry(&mut self) -> Option<Entry<K, V>> {
        match self {
            Bucket::Empty => None,
            Bucket::Chain(chain) => {
                let node = free_entry(chain.head);
                chain.len -= 1;
                if chain.len == 0 {
                    *self = Bucket::Empty;
                } else {
                    // UNREACHABLE: A remaining length above zero means the head had a successor.
                    chain.head = unsafe { node.next.unreachable() };
                }
                Some(node)
            },
            Bucket::Tree(tb) => {
                let first = tb.bin.first_id();
                debug_assert_ne!(first, NIL);
                let same = tb.bin.value_mut(first);
                let head = same.0;
                let node = free_entry(head);
                match node.next {
                    Some(next) => same.0 = next,
                    None => {
                        tb.bin.remove_id(first);
                    },
                }
                tb.len -= 1;
                if tb.len == 0 {
                    *self = Bucket::Empty;
                }
                Some(node)
            },
        }
    }

    /// Frees every entry, leaving the bucket empty.
    pub fn clear_entries(&mut self) {
        while self.pop_entry().is_some() {}
    }
}

fn find_in_chain<K, V, Q>(head: Option<EntryPtr<K, V>>, hash: u64, key: &Q) -> Option<EntryPtr<K, V>>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    let mut curr = head;
    while let Some(ptr) = curr {
        let node = entry(ptr);
        if node.hash == hash && node.key.borrow() == key {
            return Some(ptr);
        }
        curr = node.next;
    }
    None
}

/// Unlinks the matching entry from a chain known to stay non-empty-headed through an
/// `Option`-typed head slot. Returns the detached pointer; the caller frees it.
fn unlink_from_chain_opt<K, V, Q>(
    head: &mut Option<EntryPtr<K, V>>,
    hash: u64,
    key: &Q,
) -> Option<EntryPtr<K, V>>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    let first = (*head)?;
    let first_node = entry(first);
    if first_node.hash == hash && first_node.key.borrow() == key {
        *head = first_node.next;
        return Some(first);
    }

    let mut prev = first;
    let mut curr = first_node.next;
    while let Some(ptr) = curr {
        let node = entry(ptr);
        if node.hash == hash && node.key.borrow() == key {
            entry_mut(prev).next = node.next;
            return Some(ptr);
        }
        prev = ptr;
        curr = node.next;
    }
    None
}

/// Chain-bucket variant of [`unlink_from_chain_opt`], where the head slot is a plain pointer.
/// If the head itself is unlinked with no successor, the stale head pointer is left in place;
/// the caller observes the decremented length and resets the bucket before it can be read.
fn unlink_from_chain<K, V, Q>(
    head: &mut EntryPtr<K, V>,
    hash: u64,
    key: &Q,
) -> Option<EntryPtr<K, V>>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    let mut slot = Some(*head);
    let removed = unlink_from_chain_opt(&mut slot, hash, key)?;
    if let Some(new_head) = slot {
        *head = new_head;
    }
    Some(removed)
}

/// Consumes a bucket, handing every entry (with a stale `next` link) to `f`. The callee owns the
/// entries afterwards and must relink or free them.
pub(crate) fn drain_bucket<K, V>(bucket: Bucket<K, V>, mut f: impl FnMut(EntryPtr<K, V>)) {
    match bucket {
        Bucket::Empty => {},
        Bucket::Chain(chain) => {
            let mut curr = Some(chain.head);
            while let Some(ptr) = curr {
                // Read the link before f is allowed to overwrite it.
                let next = entry(ptr).next;
                f(ptr);
                curr = next;
            }
        },
        Bucket::Tree(mut tb) => {
            while let Some((_, same)) = tb.bin.pop_first() {
                let mut curr = Some(same.0);
                while let Some(ptr) = curr {
                    let next = entry(ptr).next;
                    f(ptr);
                    curr = next;
                }
            }
        },
    }
}

/// Reorganizes a chain into a balanced bin. Relative order of same-hash entries is preserved.
pub(crate) fn treeify_chain<K, V>(chain: Chain<K, V>) -> TreeBin<K, V> {
    let len = chain.len;
    let mut bin: RbTree<u64, SameHash<K, V>> = RbTree::new();

    drain_bucket(Bucket::Chain(chain), |ptr| {
        let node = entry_mut(ptr);
        node.next = None;
        match bin.get_mut(&node.hash) {
            Some(same) => {
                // Append behind existing entries with the same hash.
                let mut tail = same.0;
                while let Some(next) = entry(tail).next {
                    tail = next;
                }
                entry_mut(tail).next = Some(ptr);
            },
            None => {
                bin.insert(node.hash, SameHash(ptr));
            },
        }
    });

    TreeBin { bin, len }
}

/// Collapses a bin back into a plain chain, in ascending hash order.
pub(crate) fn untreeify_bin<K, V>(tb: TreeBin<K, V>) -> Bucket<K, V> {
    let len = tb.len;
    let mut head: Option<EntryPtr<K, V>> = None;
    let mut tail: Option<EntryPtr<K, V>> = None;

    drain_bucket(Bucket::Tree(tb), |ptr| {
        entry_mut(ptr).next = None;
        match tail {
            Some(prev) => entry_mut(prev).next = Some(ptr),
            None => head = Some(ptr),
        }
        tail = Some(ptr);
    });

    match head {
        // UNREACHABLE: Bins are never empty; an emptied bucket reverts to Empty before this.
        None => Bucket::Empty,
        Some(head) => Bucket::Chain(Chain { head, len }),
    }
}
