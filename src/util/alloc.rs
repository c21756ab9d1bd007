use std::cell::Cell;
use std::rc::Rc;

/// A zero-sized marker used to check that containers never touch the allocator for ZSTs.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[allow(unused)]
pub struct ZeroSizedType;

/// A value whose clones all increment a shared counter when dropped, for verifying that
/// containers drop exactly the elements they own.
#[derive(Debug)]
#[allow(unused)]
pub struct DropCounter(Rc<Cell<usize>>);

impl DropCounter {
    #[allow(unused)]
    pub fn new() -> DropCounter {
        DropCounter(Rc::new(Cell::new(0)))
    }

    /// The number of clones (and/or the original) dropped so far.
    #[allow(unused)]
    pub fn count(&self) -> usize {
        self.0.get()
    }
}

impl Clone for DropCounter {
    fn clone(&self) -> Self {
        DropCounter(Rc::clone(&self.0))
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}
