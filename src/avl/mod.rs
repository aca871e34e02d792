//! Self-balancing search tree keyed by a record's mean variation
//!
//! [`SearchTree`] implements the ordered insert / search / delete discipline
//! of a binary search tree over [`Record`] keys, with no duplicate keys. The
//! shape maintenance after each mutation is delegated to a [`Rebalance`]
//! policy:
//! - [`AvlTree`] applies AVL rotations so that every node's subtree heights
//!   differ by at most one
//! - [`BinarySearchTree`] never rotates
//!
//! Nodes live in a [`NodeArena`] and refer to their children by id. There
//! are no parent links; parent, grandparent and uncle queries re-descend
//! from the root.
//!
//! The tree is single-writer: mutation takes `&mut self`, so the borrow
//! checker already rules out reads overlapping a rotation.

mod ancestry;
mod balance;
mod error;
mod iter;
mod node;
#[cfg(test)]
mod tests;

pub use ancestry::NodeInfo;
pub use balance::{AvlBalance, Rebalance, Unbalanced};
pub use error::{TreeError, TreeResult};
pub use iter::InOrder;
pub use node::{Node, NodeArena, NodeId};

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::record::{Key, Record, mean};

/// AVL-balanced tree, the engine used by the rest of the crate
pub type AvlTree = SearchTree<AvlBalance>;

/// Plain binary search tree with the same ordering rules and no rotations
pub type BinarySearchTree = SearchTree<Unbalanced>;

/// Result of an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new node was linked into the tree
    Inserted,
    /// A node with the same key already exists; the tree is unchanged
    Duplicate,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// Matching policy for user-entered keys
///
/// The tree itself always compares keys exactly. Keys typed by a person
/// rarely reproduce a computed mean bit-for-bit, so lookups coming from the
/// outside may ask for the first node whose key lies strictly within
/// `tolerance` of the requested value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Bit-exact comparison
    pub const EXACT: Tolerance = Tolerance(0.0);

    /// Tolerance applied to keys typed by a user
    pub const DEFAULT: Tolerance = Tolerance(1e-4);

    /// Returns `None` for negative or non-finite values
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Tolerance(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Check whether `a` and `b` are the same key under this tolerance
    pub fn matches(self, a: Key, b: Key) -> bool {
        if self.0 == 0.0 {
            a == b
        } else {
            (a - b).abs() < self.0
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::DEFAULT
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary search tree over records, ordered by [`Record::key`]
///
/// Invariants held between calls:
/// - every key in a node's left subtree is strictly smaller than its key,
///   every key in its right subtree strictly greater
/// - no two nodes share a key
/// - with [`AvlBalance`], |height(left) - height(right)| <= 1 at every node
#[derive(Debug)]
pub struct SearchTree<B: Rebalance = AvlBalance> {
    /// Root node ID (None if tree is empty)
    root: Option<NodeId>,

    /// Node storage
    arena: NodeArena,

    /// Number of records in the tree
    len: usize,

    _policy: PhantomData<B>,
}

impl<B: Rebalance> Default for SearchTree<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Rebalance> SearchTree<B> {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self {
            root: None,
            arena: NodeArena::new(),
            len: 0,
            _policy: PhantomData,
        }
    }

    /// Build a tree by inserting `records` one by one, in order
    ///
    /// Returns the tree and the number of records rejected as duplicates.
    pub fn from_records<I>(records: I) -> (Self, usize)
    where
        I: IntoIterator<Item = Record>,
    {
        let mut tree = Self::new();
        let mut duplicates = 0;
        for record in records {
            if tree.insert(record) == InsertOutcome::Duplicate {
                duplicates += 1;
            }
        }
        (tree, duplicates)
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Get number of records in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    /// Remove every record
    pub fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
        self.len = 0;
    }

    /// Record stored at the root
    pub fn root(&self) -> Option<&Record> {
        self.root.map(|id| self.arena[id].record())
    }

    /// Root node ID, for read-only walks over [`SearchTree::node`]
    pub fn root_node_id(&self) -> Option<NodeId> {
        self.root
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Height with the balancing convention: 0 when empty, 1 for a single node
    pub fn height(&self) -> i32 {
        self.arena.avl_height(self.root)
    }

    /// Height with the diagnostic convention: -1 when empty, 0 for a single node
    pub fn diagnostic_height(&self) -> i32 {
        self.arena.diagnostic_height(self.root)
    }

    /// Sum of every key
    pub fn sum_of_keys(&self) -> f64 {
        self.in_order().map(Record::key).sum()
    }

    /// Mean of every key, `None` when empty
    pub fn mean_key(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            let keys: Vec<Key> = self.in_order().map(Record::key).collect();
            Some(mean(&keys))
        }
    }

    // ========== Search Operations ==========

    /// Exact search by key
    pub fn search(&self, key: Key) -> Option<&Record> {
        self.find(key).map(|id| self.arena[id].record())
    }

    /// Search accepting the first key on the descent path within `tolerance`
    pub fn search_within(&self, key: Key, tolerance: Tolerance) -> Option<&Record> {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.arena[id];
            if tolerance.matches(node.key(), key) {
                return Some(node.record());
            }
            current = if key < node.key() {
                node.left
            } else {
                node.right
            };
        }
        None
    }

    /// Check if a record with exactly this key is stored
    pub fn contains(&self, key: Key) -> bool {
        self.find(key).is_some()
    }

    /// Record with the smallest key
    ///
    /// # Errors
    /// * `TreeError::EmptyTree` - there is no minimum of an empty tree
    pub fn minimum(&self) -> TreeResult<&Record> {
        let root = self.root.ok_or(TreeError::EmptyTree)?;
        Ok(self.arena[self.min_node(root)].record())
    }

    /// Record with the largest key
    pub fn maximum(&self) -> TreeResult<&Record> {
        let mut current = self.root.ok_or(TreeError::EmptyTree)?;
        while let Some(right) = self.arena[current].right {
            current = right;
        }
        Ok(self.arena[current].record())
    }

    /// Find the node holding exactly `key`
    fn find(&self, key: Key) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.arena[id];
            current = match key.partial_cmp(&node.key())? {
                Ordering::Equal => return Some(id),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// Leftmost node of the subtree rooted at `id`
    fn min_node(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(left) = self.arena[current].left {
            current = left;
        }
        current
    }

    // ========== Insert Operations ==========

    /// Insert a record at the position given by its key
    ///
    /// A record whose key is already present is rejected and dropped; the
    /// tree is left untouched and `InsertOutcome::Duplicate` is returned.
    pub fn insert(&mut self, record: Record) -> InsertOutcome {
        let key = record.key();
        let mut outcome = InsertOutcome::Duplicate;
        let root = self.insert_at(self.root, record, &mut outcome);
        self.root = Some(root);

        match outcome {
            InsertOutcome::Inserted => self.len += 1,
            InsertOutcome::Duplicate => debug!("Duplicated key {key}, not inserted"),
        }
        outcome
    }

    /// Insert below `node`, returning the (possibly rotated) subtree root
    fn insert_at(
        &mut self,
        node: Option<NodeId>,
        record: Record,
        outcome: &mut InsertOutcome,
    ) -> NodeId {
        let Some(id) = node else {
            *outcome = InsertOutcome::Inserted;
            return self.arena.allocate(Node::new(record));
        };

        let key = record.key();
        let node_key = self.arena[id].key();

        if key < node_key {
            let left = self.arena[id].left;
            self.arena[id].left = Some(self.insert_at(left, record, outcome));
        } else if key > node_key {
            let right = self.arena[id].right;
            self.arena[id].right = Some(self.insert_at(right, record, outcome));
        } else {
            *outcome = InsertOutcome::Duplicate;
            return id;
        }

        B::after_insert(&mut self.arena, id, key)
    }

    // ========== Delete Operations ==========

    /// Remove the record stored under exactly `key`
    ///
    /// Returns the removed record, or `None` if no node holds `key`.
    /// When the node has two children, the in-order successor's record
    /// moves into it and the successor's own node is unlinked instead.
    pub fn remove(&mut self, key: Key) -> Option<Record> {
        self.find(key)?;

        let mut removed = None;
        self.root = self.remove_at(self.root, key, &mut removed);

        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Remove `key` below `node`, returning the new subtree root
    fn remove_at(
        &mut self,
        node: Option<NodeId>,
        key: Key,
        removed: &mut Option<Record>,
    ) -> Option<NodeId> {
        let id = node?;
        let node_key = self.arena[id].key();

        let subtree_root = if key < node_key {
            let left = self.arena[id].left;
            self.arena[id].left = self.remove_at(left, key, removed);
            id
        } else if key > node_key {
            let right = self.arena[id].right;
            self.arena[id].right = self.remove_at(right, key, removed);
            id
        } else {
            match (self.arena[id].left, self.arena[id].right) {
                (Some(_), Some(right)) => {
                    let successor_key = self.arena[self.min_node(right)].key();
                    let mut successor = None;
                    self.arena[id].right = self.remove_at(Some(right), successor_key, &mut successor);

                    debug_assert!(successor.is_some(), "successor is in the right subtree");
                    if let Some(successor) = successor {
                        let old = std::mem::replace(&mut self.arena[id].record, successor);
                        *removed = Some(old);
                    }
                    id
                }
                (Some(child), None) | (None, Some(child)) => {
                    *removed = self.arena.free(id).map(|n| n.record);
                    child
                }
                (None, None) => {
                    *removed = self.arena.free(id).map(|n| n.record);
                    return None;
                }
            }
        };

        Some(B::after_remove(&mut self.arena, subtree_root))
    }

    // ========== Validation ==========

    /// Walk the whole tree and verify ordering, uniqueness and node count
    ///
    /// With `balanced` set, also verify the AVL height condition.
    fn check(&self, balanced: bool) -> TreeResult<()> {
        self.check_subtree(self.root, None, None, balanced)?;

        let reachable = self.arena.subtree_len(self.root);
        if reachable != self.len || self.arena.live() != self.len {
            return Err(TreeError::InvariantViolation {
                key: self.root().map_or(0.0, Record::key),
                reason: format!(
                    "len={} but {} reachable and {} allocated",
                    self.len,
                    reachable,
                    self.arena.live()
                ),
            });
        }
        Ok(())
    }

    /// Returns the balancing-convention height of the subtree
    fn check_subtree(
        &self,
        node: Option<NodeId>,
        lower: Option<Key>,
        upper: Option<Key>,
        balanced: bool,
    ) -> TreeResult<i32> {
        let Some(id) = node else {
            return Ok(0);
        };
        let node = self.arena.get(id).ok_or(TreeError::NodeNotFound(id))?;
        let key = node.key();

        if lower.is_some_and(|low| key <= low) || upper.is_some_and(|high| key >= high) {
            return Err(TreeError::InvariantViolation {
                key,
                reason: format!("key outside ({lower:?}, {upper:?})"),
            });
        }

        let left = self.check_subtree(node.left, lower, Some(key), balanced)?;
        let right = self.check_subtree(node.right, Some(key), upper, balanced)?;

        if balanced && (left - right).abs() > 1 {
            return Err(TreeError::InvariantViolation {
                key,
                reason: format!("balance factor {}", left - right),
            });
        }

        Ok(1 + left.max(right))
    }

    /// Verify ordering and uniqueness over the whole tree
    pub fn check_order(&self) -> TreeResult<()> {
        self.check(false)
    }
}

impl SearchTree<AvlBalance> {
    /// Verify ordering, uniqueness and the AVL height condition
    pub fn check_invariants(&self) -> TreeResult<()> {
        self.check(true)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn record(key: f64) -> Record {
        Record::new(0, format!("Country {key}"), "CTY", vec![key]).unwrap()
    }

    fn keys<B: Rebalance>(tree: &SearchTree<B>) -> Vec<f64> {
        tree.in_order().map(Record::key).collect()
    }

    #[test]
    fn test_new_tree() {
        let tree = AvlTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.diagnostic_height(), -1);
        assert_eq!(tree.root(), None);
        assert_eq!(tree.mean_key(), None);
    }

    #[test]
    fn test_single_insert_and_search() {
        let mut tree = AvlTree::new();

        assert_eq!(tree.insert(record(0.42)), InsertOutcome::Inserted);

        assert!(!tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.diagnostic_height(), 0);
        assert_eq!(tree.search(0.42).map(Record::key), Some(0.42));
        assert_eq!(tree.search(0.41), None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut tree = AvlTree::new();
        tree.insert(record(0.5));
        tree.insert(record(0.3));

        let dup = Record::new(99, "Other", "OTH", vec![0.5]).unwrap();
        assert_eq!(tree.insert(dup), InsertOutcome::Duplicate);
        assert_eq!(tree.len(), 2);

        // The first record stays
        assert_eq!(tree.search(0.5).unwrap().code(), "CTY");
    }

    #[test]
    fn test_search_within_tolerance() {
        let mut tree = AvlTree::new();
        for key in [0.5, 0.3, 0.8] {
            tree.insert(record(key));
        }

        assert!(tree.search(0.30004).is_none());
        assert_eq!(
            tree.search_within(0.30004, Tolerance::DEFAULT).map(Record::key),
            Some(0.3)
        );
        assert!(tree.search_within(0.3002, Tolerance::DEFAULT).is_none());
        assert_eq!(
            tree.search_within(0.8, Tolerance::EXACT).map(Record::key),
            Some(0.8)
        );
    }

    #[test]
    fn test_tolerance_new() {
        assert_eq!(Tolerance::new(0.001).map(Tolerance::value), Some(0.001));
        assert!(Tolerance::new(-1.0).is_none());
        assert!(Tolerance::new(f64::NAN).is_none());
        assert!(Tolerance::EXACT.matches(0.1, 0.1));
        assert!(!Tolerance::EXACT.matches(0.1, 0.1 + 1e-12));
    }

    #[test]
    fn test_minimum_maximum() {
        let mut tree = AvlTree::new();
        assert_eq!(tree.minimum(), Err(TreeError::EmptyTree));
        assert_eq!(tree.maximum(), Err(TreeError::EmptyTree));

        for key in [5.0, 2.0, 8.0, 1.0, 9.0] {
            tree.insert(record(key));
        }
        assert_eq!(tree.minimum().unwrap().key(), 1.0);
        assert_eq!(tree.maximum().unwrap().key(), 9.0);
    }

    #[test]
    fn test_remove_leaf_and_one_child() {
        let mut tree = AvlTree::new();
        for key in [2.0, 1.0, 3.0, 4.0] {
            tree.insert(record(key));
        }

        // 3.0 has a single right child
        assert_eq!(tree.remove(3.0).map(|r| r.key()), Some(3.0));
        assert_eq!(keys(&tree), vec![1.0, 2.0, 4.0]);

        // 4.0 is now a leaf
        assert_eq!(tree.remove(4.0).map(|r| r.key()), Some(4.0));
        assert_eq!(keys(&tree), vec![1.0, 2.0]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_not_found() {
        let mut tree = AvlTree::new();
        assert_eq!(tree.remove(1.0), None);

        tree.insert(record(1.0));
        assert_eq!(tree.remove(2.0), None);
        assert_eq!(tree.remove(f64::NAN), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_remove_until_empty() {
        let mut tree = AvlTree::new();
        for key in [1.0, 2.0, 3.0] {
            tree.insert(record(key));
        }

        for key in [1.0, 2.0, 3.0] {
            assert!(tree.remove(key).is_some());
        }

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_sum_and_mean() {
        let mut tree = AvlTree::new();
        for key in [1.0, 2.0, 3.0, 6.0] {
            tree.insert(record(key));
        }
        assert_eq!(tree.sum_of_keys(), 12.0);
        assert_eq!(tree.mean_key(), Some(3.0));
    }

    #[test]
    fn test_mean_of_extreme_keys() {
        let mut tree = AvlTree::new();
        for key in [1e308, -1e308, 0.5e308, -0.5e308] {
            tree.insert(record(key));
        }
        assert_eq!(tree.mean_key(), Some(0.0));

        tree.insert(record(f64::MAX));
        tree.insert(record(f64::MAX / 2.0));
        let mean = tree.mean_key().unwrap();
        assert!(mean.is_finite() && mean > 0.0);
    }

    #[test]
    fn test_from_records_counts_duplicates() {
        let records = vec![record(1.0), record(2.0), record(1.0), record(3.0)];
        let (tree, duplicates) = AvlTree::from_records(records);
        assert_eq!(tree.len(), 3);
        assert_eq!(duplicates, 1);
    }

    #[test]
    fn test_clear() {
        let (mut tree, _) = AvlTree::from_records((0..10).map(|i| record(i as f64)));
        tree.clear();
        assert!(tree.is_empty());
        tree.check_invariants().unwrap();

        tree.insert(record(1.0));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_unbalanced_tree_degenerates() {
        let (tree, _) = BinarySearchTree::from_records((0..10).map(|i| record(i as f64)));
        assert_eq!(tree.height(), 10);
        tree.check_order().unwrap();

        let (tree, _) = AvlTree::from_records((0..10).map(|i| record(i as f64)));
        assert_eq!(tree.height(), 4);
    }

    #[test]
    fn test_unbalanced_remove_two_children() {
        let mut tree = BinarySearchTree::new();
        for key in [5.0, 3.0, 8.0, 7.0, 9.0] {
            tree.insert(record(key));
        }

        let removed = tree.remove(5.0).unwrap();
        assert_eq!(removed.key(), 5.0);
        // Successor 7.0 moved into the root slot
        assert_eq!(tree.root().map(Record::key), Some(7.0));
        assert_eq!(keys(&tree), vec![3.0, 7.0, 8.0, 9.0]);
        tree.check_order().unwrap();
    }
}
