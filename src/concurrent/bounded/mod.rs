pub mod bounded_queue;
pub mod error;

mod tests;

#[doc(inline)]
pub use bounded_queue::BoundedQueue;
#[doc(inline)]
pub use error::{Closed, PutTimeoutError, TakeTimeoutError, TryPutError, TryTakeError};
