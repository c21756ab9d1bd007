use std::hash::{BuildHasher, Hash, RandomState};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use super::HashMap;
use super::bucket::{self, Bucket, EntryPtr};
use crate::collections::tree::rb::{NIL, NodeId};

/// A cursor over every entry of a bucket array, walking chains directly and tree bins in hash
/// order. Holds raw pointers only, so the borrowing wrappers below decide mutability.
pub(crate) struct RawCursor<K, V> {
    buckets: NonNull<Bucket<K, V>>,
    cap: usize,
    /// The next bucket to open once the current position is exhausted.
    idx: usize,
    pos: RawPos<K, V>,
}

enum RawPos<K, V> {
    Exhausted,
    Chain(EntryPtr<K, V>),
    Tree {
        bucket: usize,
        node: NodeId,
        entry: EntryPtr<K, V>,
    },
}

// Positions are a couple of raw pointers and indices; a derive would wrongly demand K: Copy.
impl<K, V> Clone for RawPos<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for RawPos<K, V> {}

impl<K, V> RawCursor<K, V> {
    pub(crate) fn new<B: BuildHasher>(map: &HashMap<K, V, B>) -> RawCursor<K, V>
    where
        K: Hash + Eq,
    {
        RawCursor {
            buckets: map.buckets.ptr,
            cap: map.buckets.size(),
            idx: 0,
            pos: RawPos::Exhausted,
        }
    }

    fn bucket(&self, index: usize) -> &Bucket<K, V> {
        // SAFETY: The cursor is only created from a live map whose bucket array outlives it (the
        // wrappers carry the borrow), and index < cap.
        unsafe { &*self.buckets.as_ptr().add(index) }
    }

    pub(crate) fn next(&mut self) -> Option<EntryPtr<K, V>> {
        loop {
            match self.pos {
                RawPos::Chain(ptr) => {
                    self.pos = match bucket::entry(ptr).next {
                        Some(next) => RawPos::Chain(next),
                        None => RawPos::Exhausted,
                    };
                    return Some(ptr);
                },
                RawPos::Tree { bucket: index, node, entry } => {
                    self.pos = match bucket::entry(entry).next {
                        // Finish the same-hash chain first.
                        Some(next) => RawPos::Tree { bucket: index, node, entry: next },
                        None => match self.bucket(index) {
                            Bucket::Tree(tb) => match tb.bin.successor(node) {
                                NIL => RawPos::Exhausted,
                                next_node => RawPos::Tree {
                                    bucket: index,
                                    node: next_node,
                                    entry: tb.bin.value(next_node).0,
                                },
                            },
                            // UNREACHABLE: The bucket shape can't change under a live cursor.
                            _ => unreachable!(),
                        },
                    };
                    return Some(entry);
                },
                RawPos::Exhausted => {
                    if self.idx >= self.cap {
                        return None;
                    }
                    let index = self.idx;
                    self.idx += 1;

                    match self.bucket(index) {
                        Bucket::Empty => {},
                        Bucket::Chain(chain) => self.pos = RawPos::Chain(chain.head),
                        Bucket::Tree(tb) => {
                            // Bins are never empty, so first_id is a real node.
                            let first = tb.bin.first_id();
                            self.pos = RawPos::Tree {
                                bucket: index,
                                node: first,
                                entry: tb.bin.value(first).0,
                            };
                        },
                    }
                },
            }
        }
    }
}

/// A borrowed iterator over a [`HashMap`]'s entries, in arbitrary bucket order.
///
/// Checks the map's structural modification counter on every step; the borrow rules make an
/// actual violation unrepresentable in safe code, so the check is a debug assertion.
pub struct Iter<'a, K, V> {
    pub(crate) raw: RawCursor<K, V>,
    pub(crate) remaining: usize,
    pub(crate) owner_mods: &'a u64,
    pub(crate) mods: u64,
    pub(crate) _phantom: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K: Hash + Eq, V, B: BuildHasher> IntoIterator for &'a HashMap<K, V, B> {
    type Item = (&'a K, &'a V);

    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            raw: RawCursor::new(self),
            remaining: self.len(),
            owner_mods: &self.mods,
            mods: self.mods,
            _phantom: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        debug_assert_eq!(
            self.mods, *self.owner_mods,
            "HashMap structurally modified during iteration!"
        );
        let ptr = self.raw.next()?;
        self.remaining -= 1;
        let node = bucket::entry(ptr);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A borrowed iterator over a [`HashMap`]'s entries with mutable access to the values.
pub struct IterMut<'a, K, V> {
    pub(crate) raw: RawCursor<K, V>,
    pub(crate) remaining: usize,
    pub(crate) _phantom: PhantomData<(&'a K, &'a mut V)>,
}

impl<'a, K: Hash + Eq, V, B: BuildHasher> IntoIterator for &'a mut HashMap<K, V, B> {
    type Item = (&'a K, &'a mut V);

    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IterMut {
            raw: RawCursor::new(self),
            remaining: self.len(),
            _phantom: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let ptr = self.raw.next()?;
        self.remaining -= 1;
        let node = bucket::entry_mut(ptr);
        Some((&node.key, &mut node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An owned iterator over a [`HashMap`]'s entries. Entries are popped bucket by bucket, so the
/// map stays internally consistent and its own Drop reclaims whatever isn't consumed.
pub struct IntoIter<K: Hash + Eq, V, B: BuildHasher = RandomState> {
    pub(crate) map: HashMap<K, V, B>,
    pub(crate) idx: usize,
    pub(crate) remaining: usize,
}

impl<K: Hash + Eq, V, B: BuildHasher> IntoIterator for HashMap<K, V, B> {
    type Item = (K, V);

    type IntoIter = IntoIter<K, V, B>;

    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.len();
        IntoIter {
            map: self,
            idx: 0,
            remaining,
        }
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> Iterator for IntoIter<K, V, B> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < self.map.cap() {
            match self.map.buckets[self.idx].pop_entry() {
                Some(node) => {
                    self.map.len -= 1;
                    self.remaining -= 1;
                    return Some((node.key, node.value));
                },
                None => self.idx += 1,
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> ExactSizeIterator for IntoIter<K, V, B> {}

impl<K: Hash + Eq, V, B: BuildHasher> FusedIterator for IntoIter<K, V, B> {}

pub struct IntoKeys<K: Hash + Eq, V, B: BuildHasher = RandomState>(
    pub(crate) IntoIter<K, V, B>
);

impl<K: Hash + Eq, V, B: BuildHasher> Iterator for IntoKeys<K, V, B> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|e| e.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

pub struct Keys<'a, K, V>(
    pub(crate) Iter<'a, K, V>
);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|e| e.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

pub struct IntoValues<K: Hash + Eq, V, B: BuildHasher = RandomState>(
    pub(crate) IntoIter<K, V, B>
);

impl<K: Hash + Eq, V, B: BuildHasher> Iterator for IntoValues<K, V, B> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|e| e.1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

pub struct Values<'a, K, V>(
    pub(crate) Iter<'a, K, V>
);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|e| e.1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

pub struct ValuesMut<'a, K, V>(
    pub(crate) IterMut<'a, K, V>
);

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|e| e.1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
