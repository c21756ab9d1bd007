#![cfg(test)]

use super::*;
use crate::collections::contiguous::Vector;
use crate::util::hash::{FixedHash, IdentityState};

#[test]
fn test_insert_contains_remove() {
    let mut set = HashSet::<_>::new();
    assert!(set.insert(1));
    assert!(set.insert(2));
    assert!(!set.insert(1), "Duplicate insertion should report false.");

    assert_eq!(set.len(), 2);
    assert!(set.contains(&1));
    assert!(!set.contains(&3));

    assert!(set.remove(&1));
    assert!(!set.remove(&1), "Removing an absent value should report false.");
    assert_eq!(set.len(), 1);
}

#[test]
fn test_hash_collisions() {
    let mut set = HashSet::with_hasher(IdentityState);
    set.insert(FixedHash::new(0, "zero"));
    set.insert(FixedHash::new(0, "one"));
    set.insert(FixedHash::new(2, "two"));
    set.insert(FixedHash::new(0, "three"));
    set.insert(FixedHash::new(2, "four"));
    set.insert(FixedHash::new(1, "five"));

    set.remove(&FixedHash::new(0, "zero"));
    set.remove(&FixedHash::new(2, "two"));

    assert_eq!(set.len(), 4);
    for (hash, value) in [(0, "one"), (0, "three"), (2, "four"), (1, "five")] {
        assert!(
            set.contains(&FixedHash::new(hash, value)),
            "Collision handling must never lose elements during removal."
        );
    }

    let mut values: Vector<_> = set.into_iter().map(|i| i.value()).collect();
    values.sort_unstable();
    assert_eq!(&*values, &["five", "four", "one", "three"]);
}

#[test]
fn test_take_and_get() {
    let mut set = HashSet::<String>::new();
    set.insert(String::from("alpha"));

    assert_eq!(set.get("alpha"), Some(&String::from("alpha")));
    assert_eq!(set.take("alpha"), Some(String::from("alpha")));
    assert!(set.is_empty());
}

#[cfg(feature = "traits")]
#[test]
fn test_set_algebra() {
    use crate::collections::traits::Set;

    let left: HashSet<_> = (0..6).collect();
    let right: HashSet<_> = (3..9).collect();

    let mut diff: Vector<_> = left.difference(&right).copied().collect();
    diff.sort_unstable();
    assert_eq!(&*diff, &[0, 1, 2]);

    let mut inter: Vector<_> = left.intersection(&right).copied().collect();
    inter.sort_unstable();
    assert_eq!(&*inter, &[3, 4, 5]);

    let mut union: Vector<_> = left.union(&right).copied().collect();
    union.sort_unstable();
    assert_eq!(&*union, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);

    assert!((1..3).collect::<HashSet<_>>().is_subset(&left));
    assert!(right.is_superset(&(4..6).collect::<HashSet<_>>()));
}
