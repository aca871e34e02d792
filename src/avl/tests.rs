use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::*;

fn record(key: f64) -> Record {
    Record::new(0, format!("Country {key}"), "CTY", vec![key]).unwrap()
}

fn keys<B: Rebalance>(tree: &SearchTree<B>) -> Vec<f64> {
    tree.in_order().map(Record::key).collect()
}

fn level_keys<B: Rebalance>(tree: &SearchTree<B>) -> Vec<Vec<f64>> {
    tree.levels()
        .into_iter()
        .map(|row| row.into_iter().map(Record::key).collect())
        .collect()
}

/// Worst-case AVL height for `n` nodes (Knuth), height counted in levels
fn avl_height_bound(n: usize) -> f64 {
    1.4405 * ((n + 2) as f64).log2() - 0.3277
}

/// Inserts `count` random keys, returns the tree and the keys that went in
fn random_tree(seed: u64, count: usize) -> (AvlTree, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = AvlTree::new();
    let mut inserted = Vec::new();

    while inserted.len() < count {
        let key: f64 = rng.gen_range(-5.0..5.0);
        if tree.insert(record(key)).is_inserted() {
            inserted.push(key);
        }
        tree.check_invariants().unwrap();
    }

    (tree, inserted)
}

// ========== Scenarios ==========

#[test]
fn test_five_insert_scenario() {
    let (tree, duplicates) = AvlTree::from_records([0.5, 0.3, 0.8, 0.2, 0.4].map(record));

    assert_eq!(duplicates, 0);
    assert_eq!(tree.root().map(Record::key), Some(0.5));
    assert_eq!(keys(&tree), vec![0.2, 0.3, 0.4, 0.5, 0.8]);
    assert_eq!(
        level_keys(&tree),
        vec![vec![0.5], vec![0.3, 0.8], vec![0.2, 0.4]]
    );
    tree.check_invariants().unwrap();
}

#[test]
fn test_remove_two_children_scenario() {
    let (mut tree, _) = AvlTree::from_records([0.5, 0.3, 0.8, 0.2, 0.4].map(record));

    let removed = tree.remove(0.5).unwrap();
    assert_eq!(removed.key(), 0.5);

    // 0.8 replaced the root, which then leaned left by two and rotated right
    assert_eq!(tree.root().map(Record::key), Some(0.3));
    assert_eq!(
        level_keys(&tree),
        vec![vec![0.3], vec![0.2, 0.8], vec![0.4]]
    );
    assert_eq!(keys(&tree), vec![0.2, 0.3, 0.4, 0.8]);
    assert_eq!(tree.len(), 4);
    tree.check_invariants().unwrap();
}

#[test]
fn test_insert_rotation_cases() {
    let cases = [
        ([0.3, 0.2, 0.1], "left-left"),
        ([0.1, 0.2, 0.3], "right-right"),
        ([0.3, 0.1, 0.2], "left-right"),
        ([0.1, 0.3, 0.2], "right-left"),
    ];

    for (order, name) in cases {
        let (tree, _) = AvlTree::from_records(order.map(record));
        assert_eq!(
            level_keys(&tree),
            vec![vec![0.2], vec![0.1, 0.3]],
            "{name} insert order {order:?}"
        );
    }
}

#[test]
fn test_remove_left_right_case() {
    let (mut tree, _) = AvlTree::from_records([5.0, 2.0, 8.0, 3.0].map(record));

    tree.remove(8.0).unwrap();

    assert_eq!(level_keys(&tree), vec![vec![3.0], vec![2.0, 5.0]]);
    tree.check_invariants().unwrap();
}

#[test]
fn test_remove_right_left_case() {
    let (mut tree, _) = AvlTree::from_records([5.0, 2.0, 8.0, 7.0].map(record));

    tree.remove(2.0).unwrap();

    assert_eq!(level_keys(&tree), vec![vec![7.0], vec![5.0, 8.0]]);
    tree.check_invariants().unwrap();
}

#[test]
fn test_remove_successor_with_right_child() {
    // 4 has two children; its successor 5 has a right child 6
    let (mut tree, _) =
        AvlTree::from_records([4.0, 2.0, 5.0, 1.0, 3.0, 6.0].map(record));

    let removed = tree.remove(4.0).unwrap();
    assert_eq!(removed.key(), 4.0);
    assert_eq!(tree.root().map(Record::key), Some(5.0));
    assert_eq!(keys(&tree), vec![1.0, 2.0, 3.0, 5.0, 6.0]);
    tree.check_invariants().unwrap();
}

#[test]
fn test_duplicate_leaves_shape_unchanged() {
    let (mut tree, _) = random_tree(7, 50);
    let before = level_keys(&tree);
    let existing = tree.in_order().nth(17).unwrap().key();

    assert_eq!(tree.insert(record(existing)), InsertOutcome::Duplicate);

    assert_eq!(tree.len(), 50);
    assert_eq!(level_keys(&tree), before);
}

// ========== Randomized ==========

#[test]
fn test_height_bound_random_inserts() {
    for (seed, count) in [(1, 10), (2, 100), (3, 1000)] {
        let (tree, _) = random_tree(seed, count);

        assert_eq!(tree.len(), count);
        assert!(
            f64::from(tree.height()) <= avl_height_bound(count),
            "height {} over bound for {} nodes",
            tree.height(),
            count
        );
    }
}

#[test]
fn test_height_bound_sorted_inserts() {
    let (tree, _) = AvlTree::from_records((0..1000).map(|i| record(i as f64)));
    assert!(f64::from(tree.height()) <= avl_height_bound(1000));
    tree.check_invariants().unwrap();
}

#[test]
fn test_in_order_strictly_ascending() {
    let (tree, inserted) = random_tree(11, 300);

    let keys = keys(&tree);
    assert_eq!(keys.len(), tree.len());
    assert!(keys.windows(2).all(|w| w[0] < w[1]));

    let mut expected = inserted;
    expected.sort_by(f64::total_cmp);
    assert_eq!(keys, expected);
}

#[test]
fn test_delete_everything_random_order() {
    let (mut tree, mut inserted) = random_tree(42, 1000);
    let mut rng = StdRng::seed_from_u64(43);
    inserted.shuffle(&mut rng);

    for (removed_so_far, key) in inserted.iter().enumerate() {
        assert_eq!(tree.remove(*key).map(|r| r.key()), Some(*key));
        assert_eq!(tree.len(), 1000 - removed_so_far - 1);
        assert!(!tree.contains(*key));
        tree.check_invariants().unwrap();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
    assert_eq!(tree.in_order().count(), 0);
}

#[test]
fn test_unbalanced_delete_everything() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut keys: Vec<f64> = (0..200).map(|i| i as f64).collect();
    keys.shuffle(&mut rng);

    let (mut tree, _) = BinarySearchTree::from_records(keys.iter().map(|&k| record(k)));
    keys.shuffle(&mut rng);

    for key in keys {
        assert!(tree.remove(key).is_some());
        tree.check_order().unwrap();
    }
    assert!(tree.is_empty());
}

proptest! {
    #[test]
    fn prop_random_operations_keep_invariants(
        ops in prop::collection::vec((any::<bool>(), -50i32..50), 0..200)
    ) {
        let mut tree = AvlTree::new();
        let mut model = BTreeSet::new();

        for (insert, k) in ops {
            let key = f64::from(k) / 10.0;
            if insert {
                prop_assert_eq!(tree.insert(record(key)).is_inserted(), model.insert(k));
            } else {
                prop_assert_eq!(tree.remove(key).is_some(), model.remove(&k));
            }
            prop_assert!(tree.check_invariants().is_ok());
            prop_assert_eq!(tree.len(), model.len());
        }

        let expected: Vec<f64> = model.iter().map(|&k| f64::from(k) / 10.0).collect();
        prop_assert_eq!(keys(&tree), expected);
    }

    #[test]
    fn prop_parent_matches_level(keys in prop::collection::btree_set(-500i32..500, 1..100)) {
        let (tree, _) = AvlTree::from_records(keys.iter().map(|&k| record(f64::from(k))));

        for k in keys {
            let key = f64::from(k);
            let level = tree.level_of(key).unwrap().unwrap();
            let parent = tree.parent_of(key).unwrap();
            prop_assert_eq!(level == 0, parent.is_none());
            if let Some(parent) = parent {
                prop_assert_eq!(tree.level_of(parent.key()).unwrap(), Some(level - 1));
            }
        }
    }
}
