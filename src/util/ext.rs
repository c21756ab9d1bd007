use std::error::Error;
use std::hint;

pub(crate) trait OptionExtension<T> {
    unsafe fn unreachable(self) -> T;
}

impl<T> OptionExtension<T> for Option<T> {
    /// Acts like [`Option::unwrap`], except that the none branch is declared impossible:
    /// [`unreachable!`] in dev builds and [`unreachable_unchecked`](hint::unreachable_unchecked)
    /// in release builds.
    ///
    /// Call sites carry an `UNREACHABLE:` comment explaining why none can't occur, in the same way
    /// unsafe blocks carry `SAFETY:` comments.
    unsafe fn unreachable(self) -> T {
        match self {
            Some(val) => val,
            None if cfg!(debug_assertions) => unreachable!(),
            // SAFETY: It is the responsibility of the caller to ensure that None is impossible
            // when invoking this method.
            None => unsafe { hint::unreachable_unchecked() },
        }
    }
}

pub(crate) trait ResultExtension<T, E: Error> {
    /// A method similar to [`Result::unwrap`], restricted to error types implementing [`Error`],
    /// which panics with the message of the error itself rather than wrapping it in unwrap
    /// boilerplate.
    ///
    /// # Panics
    /// Panics if the [`Result`] is an [`Err`].
    fn throw(self) -> T;
}

impl<T, E: Error> ResultExtension<T, E> for Result<T, E> {
    fn throw(self) -> T {
        match self {
            Ok(val) => val,
            Err(error) => panic!("{}", error),
        }
    }
}
