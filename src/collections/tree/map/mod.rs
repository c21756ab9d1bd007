pub mod iter;
pub mod tree_map;

mod tests;

#[doc(inline)]
pub use iter::{IntoIter, Iter};
#[doc(inline)]
pub use tree_map::TreeMap;
