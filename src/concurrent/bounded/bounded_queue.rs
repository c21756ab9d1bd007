use std::fmt::{self, Debug, Formatter};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::error::{Closed, PutTimeoutError, TakeTimeoutError, TryPutError, TryTakeError};
use crate::collections::linked::LinkedList;
use crate::util::ext::OptionExtension;

/// A capacity-bounded queue whose `put` and `take` suspend the calling thread instead of
/// failing: producers wait while full, consumers wait while empty. That suspension is the
/// backpressure mechanism between stages of a pipeline.
///
/// The buffer is the crate's own [`LinkedList`], guarded by a mutex with two condition
/// variables (`not_full` for producers, `not_empty` for consumers). Every wait re-checks its
/// predicate after waking, so spurious wakeups are harmless.
///
/// # Deadlines and closing
/// The `_timeout` variants bound the suspension and fail with a timeout error once the deadline
/// passes, handing a refused element back to the caller. [`close`](BoundedQueue::close) wakes
/// every waiter: pending and future `put`s fail with [`Closed`], while `take` keeps draining
/// whatever is buffered and only then reports [`Closed`]. Closing is the cancellation story -
/// there is no way to interrupt a single waiter from outside.
///
/// # Fairness
/// By default, waiters race to re-acquire the mutex on wakeup, so under heavy contention grant
/// order isn't guaranteed to match arrival order. [`with_fairness`](BoundedQueue::with_fairness)
/// enables ticketed FIFO handoff on both sides: each waiter queues a ticket and only the front
/// ticket may proceed. Fair mode trades throughput for order - every grant broadcasts to all
/// waiters on that side so the right one can step forward.
///
/// # Examples
/// ```
/// # use basic_collections::concurrent::BoundedQueue;
/// let queue = BoundedQueue::new(2);
/// queue.put(1).unwrap();
/// queue.put(2).unwrap();
/// assert!(queue.try_put(3).is_err());
/// assert_eq!(queue.take(), Ok(1));
/// ```
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    cap: usize,
    fair: bool,
}

struct Inner<T> {
    buf: LinkedList<T>,
    closed: bool,
    next_ticket: u64,
    put_waiters: LinkedList<u64>,
    take_waiters: LinkedList<u64>,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `cap` elements, in default (unfair) mode.
    ///
    /// # Panics
    /// Panics if `cap` is 0; a zero-capacity queue could never accept an element.
    pub fn new(cap: usize) -> BoundedQueue<T> {
        Self::with_fairness(cap, false)
    }

    /// Creates a queue holding at most `cap` elements. With `fair` set, blocked producers and
    /// consumers are each granted strictly in arrival order.
    ///
    /// # Panics
    /// Panics if `cap` is 0.
    pub fn with_fairness(cap: usize, fair: bool) -> BoundedQueue<T> {
        assert!(cap > 0, "a bounded queue needs capacity for at least one element");
        BoundedQueue {
            inner: Mutex::new(Inner {
                buf: LinkedList::new(),
                closed: false,
                next_ticket: 0,
                put_waiters: LinkedList::new(),
                take_waiters: LinkedList::new(),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            cap,
            fair,
        }
    }

    /// The maximum number of buffered elements.
    pub const fn cap(&self) -> usize {
        self.cap
    }

    /// The current number of buffered elements. Valid at the moment of the check; other threads
    /// may change it immediately after.
    pub fn len(&self) -> usize {
        self.lock().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().buf.len() == self.cap
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Appends `value`, suspending the calling thread while the queue is full.
    ///
    /// Fails with [`Closed`] (returning the element) if the queue is closed before space opens
    /// up.
    pub fn put(&self, value: T) -> Result<(), Closed<T>> {
        match self.put_with_deadline(value, None) {
            Ok(()) => Ok(()),
            Err(PutTimeoutError::Closed(value)) => Err(Closed(value)),
            // UNREACHABLE: Without a deadline there is nothing to time out.
            Err(PutTimeoutError::Timeout(_)) => unsafe { None.unreachable() },
        }
    }

    /// Appends `value`, suspending the calling thread for at most `timeout` while the queue is
    /// full.
    pub fn put_timeout(&self, value: T, timeout: Duration) -> Result<(), PutTimeoutError<T>> {
        self.put_with_deadline(value, Some(Instant::now() + timeout))
    }

    /// Appends `value` only if that is possible without waiting.
    pub fn try_put(&self, value: T) -> Result<(), TryPutError<T>> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(TryPutError::Closed(value));
        }
        // In fair mode, jumping ahead of queued producers would break the arrival order.
        if inner.buf.len() == self.cap || (self.fair && !inner.put_waiters.is_empty()) {
            return Err(TryPutError::Full(value));
        }

        inner.buf.push_back(value);
        self.signal_not_empty();
        Ok(())
    }

    /// Removes and returns the front element, suspending the calling thread while the queue is
    /// empty.
    ///
    /// A closed queue still hands out whatever it buffered before closing; [`Closed`] is
    /// reported only once it is drained.
    pub fn take(&self) -> Result<T, Closed> {
        match self.take_with_deadline(None) {
            Ok(value) => Ok(value),
            Err(TakeTimeoutError::Closed) => Err(Closed(())),
            // UNREACHABLE: Without a deadline there is nothing to time out.
            Err(TakeTimeoutError::Timeout) => unsafe { None.unreachable() },
        }
    }

    /// Removes and returns the front element, suspending the calling thread for at most
    /// `timeout` while the queue is empty.
    pub fn take_timeout(&self, timeout: Duration) -> Result<T, TakeTimeoutError> {
        self.take_with_deadline(Some(Instant::now() + timeout))
    }

    /// Removes and returns the front element only if that is possible without waiting.
    pub fn try_take(&self) -> Result<T, TryTakeError> {
        let mut inner = self.lock();
        if self.fair && !inner.take_waiters.is_empty() {
            return Err(TryTakeError::Empty);
        }
        match inner.buf.pop_front() {
            Some(value) => {
                self.signal_not_full();
                Ok(value)
            },
            None if inner.closed => Err(TryTakeError::Closed),
            None => Err(TryTakeError::Empty),
        }
    }

    /// Closes the queue and wakes every suspended producer and consumer. Idempotent.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
        drop(inner);
    }
}

impl<T> BoundedQueue<T> {
    /// Mutex poisoning only means another thread panicked mid-operation; the buffer itself is a
    /// plain list whose invariants hold between statements, so the state is recovered rather
    /// than propagating the panic.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn signal_not_empty(&self) {
        // Fair mode must broadcast: a targeted wake could land on a non-front waiter, which
        // would go straight back to sleep and strand the grant.
        if self.fair {
            self.not_empty.notify_all();
        } else {
            self.not_empty.notify_one();
        }
    }

    fn signal_not_full(&self) {
        if self.fair {
            self.not_full.notify_all();
        } else {
            self.not_full.notify_one();
        }
    }

    fn put_with_deadline(
        &self,
        value: T,
        deadline: Option<Instant>,
    ) -> Result<(), PutTimeoutError<T>> {
        let mut inner = self.lock();

        if inner.closed {
            return Err(PutTimeoutError::Closed(value));
        }

        let ticket = if self.fair {
            let ticket = inner.next_ticket;
            inner.next_ticket += 1;
            inner.put_waiters.push_back(ticket);
            Some(ticket)
        } else {
            None
        };

        loop {
            if inner.closed {
                Self::abandon_ticket(&mut inner.put_waiters, ticket);
                self.not_full.notify_all();
                return Err(PutTimeoutError::Closed(value));
            }

            let may_proceed = inner.buf.len() < self.cap
                && match ticket {
                    Some(ticket) => inner.put_waiters.front() == Some(&ticket),
                    None => true,
                };
            if may_proceed {
                if ticket.is_some() {
                    inner.put_waiters.pop_front();
                }
                break;
            }

            inner = match self.wait(&self.not_full, inner, deadline) {
                Ok(inner) => inner,
                Err(mut inner) => {
                    Self::abandon_ticket(&mut inner.put_waiters, ticket);
                    self.not_full.notify_all();
                    return Err(PutTimeoutError::Timeout(value));
                },
            };
        }

        inner.buf.push_back(value);
        self.signal_not_empty();
        if self.fair {
            // There may be space left; let the next ticket holder re-check.
            self.not_full.notify_all();
        }
        Ok(())
    }

    fn take_with_deadline(&self, deadline: Option<Instant>) -> Result<T, TakeTimeoutError> {
        let mut inner = self.lock();

        let ticket = if self.fair {
            let ticket = inner.next_ticket;
            inner.next_ticket += 1;
            inner.take_waiters.push_back(ticket);
            Some(ticket)
        } else {
            None
        };

        loop {
            let may_proceed = !inner.buf.is_empty()
                && match ticket {
                    Some(ticket) => inner.take_waiters.front() == Some(&ticket),
                    None => true,
                };
            if may_proceed {
                if ticket.is_some() {
                    inner.take_waiters.pop_front();
                }
                break;
            }

            // Drained and closed; nothing will ever arrive.
            if inner.closed && inner.buf.is_empty() {
                Self::abandon_ticket(&mut inner.take_waiters, ticket);
                self.not_empty.notify_all();
                return Err(TakeTimeoutError::Closed);
            }

            inner = match self.wait(&self.not_empty, inner, deadline) {
                Ok(inner) => inner,
                Err(mut inner) => {
                    Self::abandon_ticket(&mut inner.take_waiters, ticket);
                    self.not_empty.notify_all();
                    return Err(TakeTimeoutError::Timeout);
                },
            };
        }

        // UNREACHABLE: may_proceed checked non-emptiness under the lock.
        let value = unsafe { inner.buf.pop_front().unreachable() };
        self.signal_not_full();
        if self.fair {
            self.not_empty.notify_all();
        }
        Ok(value)
    }

    /// Blocks on `condvar` until woken or past the deadline. Returns the reacquired guard, Err
    /// if the deadline expired.
    fn wait<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, Inner<T>>,
        deadline: Option<Instant>,
    ) -> Result<MutexGuard<'a, Inner<T>>, MutexGuard<'a, Inner<T>>> {
        match deadline {
            None => Ok(condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(guard);
                }
                let (guard, _timed_out) = condvar
                    .wait_timeout(guard, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner);
                // Even on a timeout wakeup the predicate is re-checked by the caller; only a
                // deadline that has truly passed aborts the wait.
                if Instant::now() >= deadline {
                    Err(guard)
                } else {
                    Ok(guard)
                }
            },
        }
    }

    /// Removes a waiter's ticket wherever it sits in the queue, so an abandoned wait (timeout or
    /// close) can never stall the grant chain behind it.
    fn abandon_ticket(waiters: &mut LinkedList<u64>, ticket: Option<u64>) {
        if let Some(ticket) = ticket
            && let Some(index) = waiters.iter().position(|waiting| *waiting == ticket)
        {
            waiters.remove(index);
        }
    }
}

impl<T> Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("BoundedQueue")
            .field("len", &inner.buf.len())
            .field("cap", &self.cap)
            .field("closed", &inner.closed)
            .field("fair", &self.fair)
            .finish()
    }
}
