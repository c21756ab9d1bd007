use std::fmt::{self, Debug, Formatter};
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};

struct Node<T> {
    /// Uninitialized in the sentinel; initialized in every linked node until the winning `poll`
    /// moves the value out (at which point the node becomes the new sentinel).
    value: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

/// An unbounded multi-producer multi-consumer queue that never blocks.
///
/// This is the classic two-pointer design: a singly linked list behind a sentinel, where `offer`
/// races to swing the last node's `next` from null to a fresh node and `poll` races to swing the
/// head forward. The tail pointer is only a hint - it may lag behind the true last node after a
/// winning `offer`, and whichever thread notices next helps it forward. Progress is lock-free:
/// a stalled thread can delay its own operation, never the queue's.
///
/// Unlinked nodes are handed to `crossbeam-epoch`, which frees them once no thread can still be
/// reading them; that is what makes the head CAS safe against the ABA problem without a garbage
/// collector.
///
/// # Weak `len`
/// [`len`](LockFreeQueue::len) reads a counter that is updated after the fact by each winning
/// operation. Under contention it is approximate - a snapshot that may already be stale - and it
/// is deliberately not linearizable with the queue's contents. Don't build invariants on it;
/// it exists for monitoring.
///
/// # Examples
/// ```
/// # use basic_collections::concurrent::LockFreeQueue;
/// let queue = LockFreeQueue::new();
/// queue.offer(1);
/// queue.offer(2);
/// assert_eq!(queue.poll(), Some(1));
/// assert_eq!(queue.poll(), Some(2));
/// assert_eq!(queue.poll(), None);
/// ```
pub struct LockFreeQueue<T> {
    head: Atomic<Node<T>>,
    tail: Atomic<Node<T>>,
    len: AtomicUsize,
}

impl<T> LockFreeQueue<T> {
    /// Creates an empty queue: head and tail both point at a value-less sentinel node.
    pub fn new() -> LockFreeQueue<T> {
        let queue = LockFreeQueue {
            head: Atomic::null(),
            tail: Atomic::null(),
            len: AtomicUsize::new(0),
        };

        let sentinel = Owned::new(Node {
            value: MaybeUninit::uninit(),
            next: Atomic::null(),
        });

        // SAFETY: The queue isn't shared yet, so the unprotected guard can't race anything.
        let guard = unsafe { epoch::unprotected() };
        let sentinel = sentinel.into_shared(guard);
        queue.head.store(sentinel, Ordering::Relaxed);
        queue.tail.store(sentinel, Ordering::Relaxed);

        queue
    }

    /// Appends `value` at the back of the queue. Never blocks; contended attempts retry their
    /// compare-and-swap until one wins.
    pub fn offer(&self, value: T) {
        let guard = epoch::pin();
        let new = Owned::new(Node {
            value: MaybeUninit::new(value),
            next: Atomic::null(),
        })
        .into_shared(&guard);

        loop {
            let tail = self.tail.load(Ordering::Acquire, &guard);
            // SAFETY: head and tail always point at a live node; the epoch guard keeps any node
            // they could reference alive for the duration of the pin.
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, &guard);

            if !next.is_null() {
                // The tail hint lags behind the true last node; help it forward and retry.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    &guard,
                );
                continue;
            }

            if tail_ref
                .next
                .compare_exchange(Shared::null(), new, Ordering::Release, Ordering::Relaxed, &guard)
                .is_ok()
            {
                // Linking succeeded; swinging the tail hint is best-effort, the next operation
                // will correct it if this CAS loses.
                let _ = self.tail.compare_exchange(
                    tail,
                    new,
                    Ordering::Release,
                    Ordering::Relaxed,
                    &guard,
                );
                self.len.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
    }

    /// Removes and returns the front value, or None if the queue looks empty. Never blocks.
    pub fn poll(&self) -> Option<T> {
        let guard = epoch::pin();
        self.poll_with(&guard)
    }

    fn poll_with(&self, guard: &Guard) -> Option<T> {
        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            // SAFETY: As in offer: head is never null and the guard keeps it alive.
            let head_ref = unsafe { head.deref() };
            let next = head_ref.next.load(Ordering::Acquire, guard);

            // SAFETY: A non-null next is a live node under the same guard.
            let next_ref = match unsafe { next.as_ref() } {
                None => return None,
                Some(next_ref) => next_ref,
            };

            // Don't let the tail hint point at a node about to be unlinked.
            let tail = self.tail.load(Ordering::Relaxed, guard);
            if tail == head {
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
            }

            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                self.len.fetch_sub(1, Ordering::Relaxed);
                // SAFETY: Winning the head CAS grants exclusive rights to this node's value; the
                // node itself stays allocated (it is the new sentinel) so the read races nothing.
                let value = unsafe { next_ref.value.as_ptr().read() };
                // SAFETY: The old sentinel is unlinked; the epoch collector frees it once every
                // pinned thread that could have loaded it has moved on.
                unsafe { guard.defer_destroy(head) };
                return Some(value);
            }
        }
    }

    /// An approximate element count. See the type-level documentation for why this is weaker
    /// than `len` on the single-owner collections.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns true if the queue had no linked nodes at the moment of the check. Like
    /// [`len`](LockFreeQueue::len), this is a snapshot, stale the moment it returns.
    pub fn is_empty(&self) -> bool {
        let guard = epoch::pin();
        let head = self.head.load(Ordering::Acquire, &guard);
        // SAFETY: head is never null.
        let head_ref = unsafe { head.deref() };
        head_ref.next.load(Ordering::Acquire, &guard).is_null()
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        // SAFETY: Drop has exclusive access, so the unprotected guard is safe and deferred
        // destructions run immediately.
        let guard = unsafe { epoch::unprotected() };

        while self.poll_with(guard).is_some() {}

        let sentinel = self.head.load(Ordering::Relaxed, guard);
        // SAFETY: After draining, only the sentinel remains and nothing else references it. Its
        // value slot is uninitialized (or already moved out), so only the node itself is freed.
        drop(unsafe { sentinel.into_owned() });
    }
}

// SAFETY: The queue hands each value to exactly one consumer, and its internal pointers are only
// mutated through atomics; sharing it across threads is what it is for.
unsafe impl<T: Send> Send for LockFreeQueue<T> {}
// SAFETY: As above; all interior mutability is CAS-mediated.
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T> Debug for LockFreeQueue<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeQueue")
            .field("len", &self.len())
            .finish()
    }
}
