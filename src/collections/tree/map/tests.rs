#![cfg(test)]

use super::*;
use crate::collections::contiguous::Vector;

#[test]
fn test_insert_lookup_remove() {
    let mut map = TreeMap::new();
    assert_eq!(map.insert(5, "five"), None);
    assert_eq!(map.insert(3, "three"), None);
    assert_eq!(map.insert(8, "eight"), None);
    assert_eq!(map.insert(5, "FIVE"), Some("five"));

    assert_eq!(map.len(), 3, "Overwrites shouldn't change the length.");
    assert_eq!(map.get(&5), Some(&"FIVE"));
    assert_eq!(map.get(&4), None);
    assert!(map.contains(&8));

    assert_eq!(map.remove(&3), Some("three"));
    assert_eq!(map.remove(&3), None);
    assert_eq!(map.len(), 2);
    map.core.check_invariants();
}

#[test]
fn test_in_order_scenario() {
    let mut map = TreeMap::new();
    for key in [10, 5, 15, 3, 7, 12, 18] {
        map.insert(key, key * 10);
    }
    map.core.check_invariants();

    let keys: Vector<_> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        &*keys,
        &[3, 5, 7, 10, 12, 15, 18],
        "In-order traversal should be sorted regardless of insertion order."
    );

    assert_eq!(
        map.remove_entry(&10),
        Some((10, 100)),
        "Removing a node with two children should return its entry."
    );
    map.core.check_invariants();

    let keys: Vector<_> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        &*keys,
        &[3, 5, 7, 12, 15, 18],
        "The remaining order should be unchanged minus the removed key."
    );
}

#[test]
fn test_invariants_across_churn() {
    let mut map = TreeMap::new();

    // A deterministic but scrambled key sequence: multiples of a generator mod a prime visit
    // every residue exactly once.
    let keys = (1..=500_u32).map(|i| (i * 379) % 1009);

    for (step, key) in keys.clone().enumerate() {
        map.insert(key, step);
        if step % 50 == 0 {
            map.core.check_invariants();
        }
    }
    map.core.check_invariants();
    assert_eq!(map.len(), 500);

    let mut expected = map.len();
    for key in keys.clone().step_by(3) {
        assert!(map.remove(&key).is_some());
        expected -= 1;
        assert_eq!(map.len(), expected, "Length should track net removals.");
    }
    map.core.check_invariants();

    let mut last = None;
    for (key, _) in map.iter() {
        if let Some(prev) = last {
            assert!(key > prev, "In-order traversal must be strictly increasing.");
        }
        last = Some(key);
    }
}

#[test]
fn test_first_last() {
    let mut map: TreeMap<_, _> = [(4, 'd'), (1, 'a'), (9, 'i'), (2, 'b')].into_iter().collect();

    assert_eq!(map.first_entry(), Some((&1, &'a')));
    assert_eq!(map.last_entry(), Some((&9, &'i')));

    assert_eq!(map.take_first_entry(), Some((1, 'a')));
    assert_eq!(map.take_last_entry(), Some((9, 'i')));
    assert_eq!(map.take_first(), Some('b'));
    assert_eq!(map.take_last(), Some('d'));
    assert_eq!(map.take_first_entry(), None);
    assert!(map.is_empty());
}

#[test]
fn test_borrowed_lookup() {
    let mut map = TreeMap::new();
    map.insert(String::from("alpha"), 1);
    map.insert(String::from("beta"), 2);

    assert_eq!(map.get("alpha"), Some(&1), "Lookup by &str should work via Borrow.");
    assert_eq!(map.remove("beta"), Some(2));
    assert_eq!(map.get("beta"), None);
}

#[test]
fn test_get_mut_and_clear() {
    let mut map: TreeMap<_, _> = (0..10).map(|i| (i, i)).collect();

    *map.get_mut(&4).expect("key 4 was inserted") = 400;
    assert_eq!(map.get(&4), Some(&400));

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.iter().next(), None);

    map.insert(1, 1);
    assert_eq!(map.len(), 1, "A cleared map should be reusable.");
}

#[test]
fn test_owned_iteration() {
    let map: TreeMap<_, _> = [(3, 'c'), (1, 'a'), (2, 'b')].into_iter().collect();
    let pairs: Vector<_> = map.into_iter().collect();
    assert_eq!(&*pairs, &[(1, 'a'), (2, 'b'), (3, 'c')]);
}

#[test]
fn test_slot_reuse() {
    let mut map = TreeMap::new();
    for i in 0..100 {
        map.insert(i, i);
    }
    for i in 0..100 {
        map.remove(&i);
    }
    for i in 0..100 {
        map.insert(i, i);
    }
    map.core.check_invariants();
    assert_eq!(map.len(), 100);
    assert_eq!(map.get(&99), Some(&99));
}

#[test]
fn test_modification_counter() {
    let mut map = TreeMap::new();
    map.insert(1, 1);
    let after_insert = map.mods;

    map.insert(1, 2);
    assert_eq!(map.mods, after_insert, "Overwriting a value isn't a structural change.");

    map.remove(&1);
    assert!(map.mods > after_insert, "Removal is a structural change.");
}
