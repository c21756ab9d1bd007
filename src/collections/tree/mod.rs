//! Tree-backed ordered collections: [`TreeMap`] and [`TreeSet`], the sorted counterparts of the
//! hash-based containers.
//!
//! Both sit on a crate-private red-black core (`rb`) whose nodes live in an index-addressed
//! arena rather than behind owning pointers. Parent links are plain indices used only for
//! traversal and rebalancing, which sidesteps the ownership cycles a parent pointer would
//! otherwise create. The hash module reuses the same core to rebalance flooded buckets.

pub mod map;
pub mod set;

pub(crate) mod rb;

#[doc(inline)]
pub use map::TreeMap;
#[doc(inline)]
pub use set::TreeSet;
