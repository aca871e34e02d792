//! Rebalancing policies and rotation primitives
//!
//! The engine in `avl` performs plain binary-search-tree descent and calls a
//! [`Rebalance`] policy at every ancestor on the way back up from an insert
//! or removal. [`Unbalanced`] leaves the shape alone; [`AvlBalance`] applies
//! the four AVL rotation cases. Every rotation returns the id of the node
//! that now roots the subtree, and the caller re-links it into the parent.

use log::trace;

use super::node::{NodeArena, NodeId};
use crate::record::Key;

/// Hook applied to each ancestor after a structural change below it
pub trait Rebalance {
    /// Called on the way back up after `key` was inserted below `node`.
    /// Returns the new root of the subtree.
    fn after_insert(arena: &mut NodeArena, node: NodeId, key: Key) -> NodeId;

    /// Called on the way back up after a node was removed below `node`.
    /// Returns the new root of the subtree.
    fn after_remove(arena: &mut NodeArena, node: NodeId) -> NodeId;
}

/// Plain binary search tree: no rotations
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbalanced;

impl Rebalance for Unbalanced {
    fn after_insert(_arena: &mut NodeArena, node: NodeId, _key: Key) -> NodeId {
        node
    }

    fn after_remove(_arena: &mut NodeArena, node: NodeId) -> NodeId {
        node
    }
}

/// Classic AVL: keeps |height(left) - height(right)| <= 1 at every node
///
/// Balance factors are recomputed from the current subtree shape at each
/// call, after the recursive step below has already re-linked its result,
/// so no stale height is ever consulted.
#[derive(Debug, Default, Clone, Copy)]
pub struct AvlBalance;

impl Rebalance for AvlBalance {
    fn after_insert(arena: &mut NodeArena, node: NodeId, key: Key) -> NodeId {
        let balance = arena.balance_factor(Some(node));

        if balance > 1 {
            let Some(left) = arena[node].left else {
                return node;
            };
            let left_key = arena[left].key();
            if key < left_key {
                trace!("insert {key}: left-left at {}", arena[node].key());
                return rotate_right(arena, node);
            }
            if key > left_key {
                trace!("insert {key}: left-right at {}", arena[node].key());
                return rotate_left_right(arena, node);
            }
        } else if balance < -1 {
            let Some(right) = arena[node].right else {
                return node;
            };
            let right_key = arena[right].key();
            if key > right_key {
                trace!("insert {key}: right-right at {}", arena[node].key());
                return rotate_left(arena, node);
            }
            if key < right_key {
                trace!("insert {key}: right-left at {}", arena[node].key());
                return rotate_right_left(arena, node);
            }
        }

        node
    }

    fn after_remove(arena: &mut NodeArena, node: NodeId) -> NodeId {
        let balance = arena.balance_factor(Some(node));

        if balance > 1 {
            let left = arena[node].left;
            if arena.balance_factor(left) >= 0 {
                trace!("remove: left-left at {}", arena[node].key());
                return rotate_right(arena, node);
            }
            trace!("remove: left-right at {}", arena[node].key());
            return rotate_left_right(arena, node);
        }

        if balance < -1 {
            let right = arena[node].right;
            if arena.balance_factor(right) <= 0 {
                trace!("remove: right-right at {}", arena[node].key());
                return rotate_left(arena, node);
            }
            trace!("remove: right-left at {}", arena[node].key());
            return rotate_right_left(arena, node);
        }

        node
    }
}

// ========== Rotations ==========

/// Simple left rotation: the right child rises
///
/// ```text
///     n                 r
///    / \               / \
///   a   r     =>      n   c
///      / \           / \
///     b   c         a   b
/// ```
pub(crate) fn rotate_left(arena: &mut NodeArena, node: NodeId) -> NodeId {
    debug_assert!(arena[node].right.is_some(), "left rotation requires a right child");
    let Some(pivot) = arena[node].right else {
        return node;
    };
    arena[node].right = arena[pivot].left;
    arena[pivot].left = Some(node);
    pivot
}

/// Simple right rotation: the left child rises
pub(crate) fn rotate_right(arena: &mut NodeArena, node: NodeId) -> NodeId {
    debug_assert!(arena[node].left.is_some(), "right rotation requires a left child");
    let Some(pivot) = arena[node].left else {
        return node;
    };
    arena[node].left = arena[pivot].right;
    arena[pivot].right = Some(node);
    pivot
}

/// Left-rotate the left child, then right-rotate `node`
pub(crate) fn rotate_left_right(arena: &mut NodeArena, node: NodeId) -> NodeId {
    debug_assert!(arena[node].left.is_some(), "left-right rotation requires a left child");
    let Some(left) = arena[node].left else {
        return node;
    };
    arena[node].left = Some(rotate_left(arena, left));
    rotate_right(arena, node)
}

/// Right-rotate the right child, then left-rotate `node`
pub(crate) fn rotate_right_left(arena: &mut NodeArena, node: NodeId) -> NodeId {
    debug_assert!(arena[node].right.is_some(), "right-left rotation requires a right child");
    let Some(right) = arena[node].right else {
        return node;
    };
    arena[node].right = Some(rotate_right(arena, right));
    rotate_left(arena, node)
}
