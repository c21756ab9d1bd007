pub mod hash_map;
pub mod iter;

pub(crate) mod bucket;


#[doc(inline)]
pub use hash_map::HashMap;
#[doc(inline)]
pub use iter::{IntoIter, IntoKeys, IntoValues, Iter, IterMut, Keys, Values, ValuesMut};
