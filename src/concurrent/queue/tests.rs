#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use super::*;
use crate::collections::contiguous::Vector;
use crate::util::alloc::DropCounter;

#[test]
fn test_single_threaded_fifo() {
    let queue = LockFreeQueue::new();
    for i in 0..100 {
        queue.offer(i);
    }
    assert_eq!(queue.len(), 100);

    for i in 0..100 {
        assert_eq!(queue.poll(), Some(i), "Uncontended offer/poll must be FIFO.");
    }
    assert_eq!(queue.poll(), None);
    assert!(queue.is_empty());
}

#[test]
fn test_interleaved_offer_poll() {
    let queue = LockFreeQueue::new();
    queue.offer(1);
    queue.offer(2);
    assert_eq!(queue.poll(), Some(1));
    queue.offer(3);
    assert_eq!(queue.poll(), Some(2));
    assert_eq!(queue.poll(), Some(3));
    assert_eq!(queue.poll(), None);
    queue.offer(4);
    assert_eq!(queue.poll(), Some(4), "The queue must be reusable after emptying.");
}

#[test]
fn test_concurrent_exchange_is_lossless() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 2_000;
    const TOTAL: usize = PRODUCERS * PER_PRODUCER;

    let queue = LockFreeQueue::new();
    let consumed = AtomicUsize::new(0);
    let mut received: Vector<Vector<usize>> = Vector::new();

    thread::scope(|scope| {
        for producer in 0..PRODUCERS {
            let queue = &queue;
            scope.spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.offer(producer * PER_PRODUCER + i);
                }
            });
        }

        let mut handles = Vector::new();
        for _ in 0..CONSUMERS {
            let queue = &queue;
            let consumed = &consumed;
            handles.push(scope.spawn(move || {
                let mut mine = Vector::new();
                while consumed.load(Ordering::Relaxed) < TOTAL {
                    match queue.poll() {
                        Some(value) => {
                            consumed.fetch_add(1, Ordering::Relaxed);
                            mine.push(value);
                        },
                        None => thread::yield_now(),
                    }
                }
                mine
            }));
        }

        for handle in handles.into_iter() {
            received.push(handle.join().expect("consumer panicked"));
        }
    });

    let mut all: Vector<usize> = Vector::with_cap(TOTAL);
    for batch in received.iter() {
        all.extend(batch.iter().copied());
    }
    assert_eq!(all.len(), TOTAL, "No value may be lost.");

    all.sort_unstable();
    for (index, value) in all.iter().enumerate() {
        assert_eq!(*value, index, "No value may be duplicated or invented.");
    }

    assert_eq!(queue.poll(), None, "Everything offered must have been consumed.");
}

#[test]
fn test_per_producer_order_is_preserved() {
    const PER_PRODUCER: usize = 1_000;

    let queue = LockFreeQueue::new();

    thread::scope(|scope| {
        // Two producers with disjoint tag spaces.
        for tag in [0usize, 1] {
            let queue = &queue;
            scope.spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.offer((tag, i));
                }
            });
        }
    });

    let mut last = [None::<usize>; 2];
    while let Some((tag, i)) = queue.poll() {
        if let Some(prev) = last[tag] {
            assert!(i > prev, "Each producer's values must dequeue in its offer order.");
        }
        last[tag] = Some(i);
    }
    assert_eq!(last[0], Some(PER_PRODUCER - 1));
    assert_eq!(last[1], Some(PER_PRODUCER - 1));
}

#[test]
fn test_drop_frees_remaining_values() {
    let counter = DropCounter::new();
    {
        let queue = LockFreeQueue::new();
        for _ in 0..10 {
            queue.offer(counter.clone());
        }
        queue.poll();
    }
    assert_eq!(
        counter.count(),
        10,
        "Dropping the queue should drop the polled value and the nine queued ones."
    );
}
