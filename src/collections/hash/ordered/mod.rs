pub mod iter;
pub mod ordered_map;


#[doc(inline)]
pub use iter::{IntoIter, Iter};
#[doc(inline)]
pub use ordered_map::OrderedHashMap;
