//! Concurrency-safe containers, shared across threads by reference with no single owner.
//!
//! Three synchronization strategies live here, one per container:
//! - [`LockFreeQueue`](queue::LockFreeQueue) never blocks: every operation is a retry loop
//!   around a compare-and-swap, with `crossbeam-epoch` reclaiming unlinked nodes safely.
//! - [`BoundedQueue`](bounded::BoundedQueue) deliberately blocks: a mutex plus two condition
//!   variables suspend producers at capacity and consumers at empty, which is exactly the
//!   backpressure a bounded pipeline wants.
//! - [`ShardedMap`](map::ShardedMap) splits its buckets across independently locked shards, so
//!   writers touching different shards never contend.

pub mod bounded;
pub mod map;
pub mod queue;

#[doc(inline)]
pub use bounded::BoundedQueue;
#[doc(inline)]
pub use map::ShardedMap;
#[doc(inline)]
pub use queue::LockFreeQueue;
