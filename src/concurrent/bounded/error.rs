use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

use derive_more::IsVariant;

/// The queue was closed while (or before) the operation waited. For puts, the rejected element
/// rides along so the caller gets it back.
#[derive(Debug, PartialEq, Eq)]
pub struct Closed<T = ()>(pub T);

impl<T> Display for Closed<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Queue closed!")
    }
}

impl<T: Debug> Error for Closed<T> {}

/// A deadline-bounded `put` failed. Either way the element comes back to the caller.
#[derive(Debug, PartialEq, Eq, IsVariant)]
pub enum PutTimeoutError<T> {
    /// The deadline expired with the queue still full.
    Timeout(T),
    /// The queue was closed while waiting.
    Closed(T),
}

impl<T> PutTimeoutError<T> {
    /// The element the queue refused.
    pub fn into_inner(self) -> T {
        match self {
            PutTimeoutError::Timeout(value) => value,
            PutTimeoutError::Closed(value) => value,
        }
    }
}

impl<T> Display for PutTimeoutError<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PutTimeoutError::Timeout(_) => write!(f, "Timed out waiting for queue space!"),
            PutTimeoutError::Closed(_) => write!(f, "Queue closed!"),
        }
    }
}

impl<T: Debug> Error for PutTimeoutError<T> {}

/// A deadline-bounded `take` failed.
#[derive(Debug, PartialEq, Eq, IsVariant)]
pub enum TakeTimeoutError {
    /// The deadline expired with the queue still empty.
    Timeout,
    /// The queue was closed and fully drained.
    Closed,
}

impl Display for TakeTimeoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TakeTimeoutError::Timeout => write!(f, "Timed out waiting for a queue element!"),
            TakeTimeoutError::Closed => write!(f, "Queue closed!"),
        }
    }
}

impl Error for TakeTimeoutError {}

/// A non-blocking `put` was refused.
#[derive(Debug, PartialEq, Eq, IsVariant)]
pub enum TryPutError<T> {
    /// The queue was full (or, in fair mode, other producers were already queued ahead).
    Full(T),
    /// The queue was closed.
    Closed(T),
}

impl<T> TryPutError<T> {
    /// The element the queue refused.
    pub fn into_inner(self) -> T {
        match self {
            TryPutError::Full(value) => value,
            TryPutError::Closed(value) => value,
        }
    }
}

impl<T> Display for TryPutError<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TryPutError::Full(_) => write!(f, "Queue full!"),
            TryPutError::Closed(_) => write!(f, "Queue closed!"),
        }
    }
}

impl<T: Debug> Error for TryPutError<T> {}

/// A non-blocking `take` found nothing to return.
#[derive(Debug, PartialEq, Eq, IsVariant)]
pub enum TryTakeError {
    /// The queue was empty (or, in fair mode, other consumers were already queued ahead).
    Empty,
    /// The queue was closed and fully drained.
    Closed,
}

impl Display for TryTakeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TryTakeError::Empty => write!(f, "Queue empty!"),
            TryTakeError::Closed => write!(f, "Queue closed!"),
        }
    }
}

impl Error for TryTakeError {}
