#![cfg(test)]

use super::*;
use crate::collections::contiguous::Vector;

#[test]
fn test_insert_contains_remove() {
    let mut set = TreeSet::new();
    assert!(set.insert(3));
    assert!(set.insert(1));
    assert!(set.insert(2));
    assert!(!set.insert(2), "Duplicate insertion should report false.");

    assert_eq!(set.len(), 3);
    assert!(set.get(&2).is_some());
    assert!(set.remove(&2));
    assert!(!set.remove(&2), "Removing an absent value should report false.");
    assert_eq!(set.len(), 2);
}

#[test]
fn test_sorted_iteration() {
    let set: TreeSet<_> = [30, 10, 20, 50, 40].into_iter().collect();
    let values: Vector<_> = set.iter().copied().collect();
    assert_eq!(&*values, &[10, 20, 30, 40, 50]);

    let owned: Vector<_> = set.into_iter().collect();
    assert_eq!(&*owned, &[10, 20, 30, 40, 50]);
}

#[test]
fn test_first_last() {
    let mut set: TreeSet<_> = (1..=5).collect();
    assert_eq!(set.first(), Some(&1));
    assert_eq!(set.last(), Some(&5));
    assert_eq!(set.take_first(), Some(1));
    assert_eq!(set.take_last(), Some(5));
    assert_eq!(set.len(), 3);
}

#[test]
fn test_take_by_borrow() {
    let mut set = TreeSet::new();
    set.insert(String::from("alpha"));
    assert_eq!(set.take("alpha"), Some(String::from("alpha")));
    assert!(set.is_empty());
}

#[cfg(feature = "traits")]
#[test]
fn test_set_algebra() {
    use crate::collections::traits::Set;

    let left: TreeSet<_> = (0..6).collect();
    let right: TreeSet<_> = (3..9).collect();

    let diff: Vector<_> = left.difference(&right).copied().collect();
    assert_eq!(&*diff, &[0, 1, 2]);

    let inter: Vector<_> = left.intersection(&right).copied().collect();
    assert_eq!(&*inter, &[3, 4, 5]);

    let union: Vector<_> = left.union(&right).copied().collect();
    assert_eq!(&*union, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);

    let sym: Vector<_> = left.symmetric_difference(&right).copied().collect();
    assert_eq!(&*sym, &[0, 1, 2, 6, 7, 8]);

    assert!((3..5).collect::<TreeSet<_>>().is_subset(&right));
    assert!(left.is_superset(&(1..3).collect::<TreeSet<_>>()));
}
