pub mod iter;
pub mod tree_set;

mod tests;

#[doc(inline)]
pub use iter::{IntoIter, Iter};
#[doc(inline)]
pub use tree_set::TreeSet;
