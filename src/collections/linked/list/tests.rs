#![cfg(test)]

use std::iter;

use super::*;
use crate::collections::contiguous::Vector;
use crate::util::alloc::DropCounter;
use crate::util::error::IndexOutOfBounds;
use crate::util::panic::assert_panics;

#[test]
fn test_push_pop_ends() {
    let mut list = LinkedList::new();
    list.push_back(2);
    list.push_front(1);
    list.push_back(3);
    list.push_front(0);
    list.verify_double_links();

    assert_eq!(list.len(), 4);
    assert_eq!(list.front(), Some(&0));
    assert_eq!(list.back(), Some(&3));

    assert_eq!(list.pop_front(), Some(0));
    assert_eq!(list.pop_back(), Some(3));
    assert_eq!(list.pop_front(), Some(1));
    assert_eq!(list.pop_front(), Some(2));
    assert_eq!(list.pop_front(), None);
    assert_eq!(list.pop_back(), None);
    assert!(list.is_empty());
}

#[test]
fn test_size_tracks_net_changes() {
    let mut list = LinkedList::new();
    for i in 0..50 {
        list.push_back(i);
    }
    for _ in 0..20 {
        list.pop_front();
    }
    for i in 0..5 {
        list.push_front(i);
    }
    assert_eq!(
        list.len(),
        35,
        "Length should equal net insertions minus removals."
    );
    list.verify_double_links();
}

#[test]
fn test_get_walks_from_nearer_end() {
    let list: LinkedList<_> = (0..10).collect();
    for i in 0..10 {
        assert_eq!(list.get(i), &i, "Indexing should agree with insertion order.");
    }
    assert_eq!(list[9], 9);
    assert_eq!(
        list.try_get(10),
        Err(IndexOutOfBounds { index: 10, len: 10 })
    );

    assert_panics!({
        let list: LinkedList<u8> = LinkedList::new();
        list.get(0);
    });
}

#[test]
fn test_insert_remove_interior() {
    let mut list: LinkedList<_> = (0..5).collect();
    list.insert(2, 100);
    list.insert(6, 200);
    list.insert(0, 300);
    list.verify_double_links();

    let collected: Vector<_> = list.iter().copied().collect();
    assert_eq!(&*collected, &[300, 0, 1, 100, 2, 3, 200, 4]);

    assert_eq!(list.remove(3), 100);
    assert_eq!(list.remove(0), 300);
    assert_eq!(list.remove(5), 200);
    list.verify_double_links();

    let collected: Vector<_> = list.iter().copied().collect();
    assert_eq!(&*collected, &[0, 1, 2, 3, 4]);

    assert_eq!(
        list.try_remove(5),
        Err(IndexOutOfBounds { index: 5, len: 5 })
    );
}

#[test]
fn test_append() {
    let mut left: LinkedList<_> = (0..3).collect();
    let mut right: LinkedList<_> = (3..6).collect();
    left.append(&mut right);
    left.verify_double_links();

    assert_eq!(left.len(), 6);
    assert!(right.is_empty(), "append should leave the source empty.");
    assert_eq!(left, (0..6).collect::<LinkedList<_>>());

    let mut empty = LinkedList::new();
    empty.append(&mut left);
    assert_eq!(empty.len(), 6, "Appending into an empty list should adopt the chain.");
}

#[test]
fn test_contains() {
    let list: LinkedList<_> = (0..5).collect();
    assert!(list.contains(&3));
    assert!(!list.contains(&7));
}

#[test]
fn test_iterators() {
    let mut list: LinkedList<_> = (0..5).collect();

    assert_eq!(list.iter().count(), 5);
    assert_eq!(list.iter().last(), Some(&4));

    for value in list.iter_mut() {
        *value *= 10;
    }
    let collected: Vector<_> = list.iter().copied().collect();
    assert_eq!(&*collected, &[0, 10, 20, 30, 40]);

    let mut owned = list.into_iter();
    assert_eq!(owned.next(), Some(0));
    assert_eq!(owned.len(), 4);
    assert_eq!(owned.sum::<i32>(), 100);
}

#[test]
fn test_drop() {
    let counter = DropCounter::new();
    let list: LinkedList<_> = iter::repeat_with(|| counter.clone()).take(10).collect();
    drop(list);
    assert_eq!(counter.count(), 10, "Dropping the list should drop every element.");

    let counter = DropCounter::new();
    let list: LinkedList<_> = iter::repeat_with(|| counter.clone()).take(10).collect();
    let mut iter = list.into_iter();
    iter.next();
    drop(iter);
    assert_eq!(
        counter.count(),
        10,
        "A partially consumed owned iterator should free the rest of the chain."
    );
}

#[test]
fn test_modification_counter() {
    let mut list = LinkedList::new();
    let initial = list.mods;

    list.push_back(1);
    list.push_front(0);
    list.pop_back();
    list.insert(1, 2);
    list.remove(0);
    list.clear();

    assert!(
        list.mods > initial,
        "Every structural operation should advance the modification counter."
    );

    let before = list.mods;
    let _ = list.iter().count();
    assert_eq!(list.mods, before, "Iteration alone should never count as a modification.");
}

#[test]
fn test_display() {
    let list: LinkedList<_> = (1..4).collect();
    assert_eq!(format!("{list}"), "(1) -> (2) -> (3)");
    assert_eq!(format!("{}", LinkedList::<u8>::new()), "()");
}
