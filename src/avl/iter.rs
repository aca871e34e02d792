use super::node::{NodeArena, NodeId};
use super::{Rebalance, SearchTree};
use crate::record::Record;

/// In-order iterator over a tree's records, ascending by key
///
/// Holds the pending left spine on an explicit stack, so memory is
/// proportional to the tree height.
pub struct InOrder<'a> {
    arena: &'a NodeArena,
    stack: Vec<NodeId>,
}

impl<'a> InOrder<'a> {
    fn new(arena: &'a NodeArena, root: Option<NodeId>) -> Self {
        let mut iter = Self {
            arena,
            stack: Vec::new(),
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            self.stack.push(id);
            current = self.arena[id].left;
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.arena[id];
        self.push_left_spine(node.right);
        Some(node.record())
    }
}

impl<B: Rebalance> SearchTree<B> {
    /// Iterate over all records in key order
    ///
    /// Each call starts a fresh traversal from the root.
    pub fn in_order(&self) -> InOrder<'_> {
        InOrder::new(&self.arena, self.root)
    }

    /// Records grouped by depth, root level first, left to right
    pub fn levels(&self) -> Vec<Vec<&Record>> {
        let height = self.diagnostic_height();
        (0..=height)
            .map(|level| {
                let mut row = Vec::new();
                self.collect_level(self.root, level, &mut row);
                row
            })
            .collect()
    }

    fn collect_level<'a>(&'a self, node: Option<NodeId>, level: i32, row: &mut Vec<&'a Record>) {
        let Some(id) = node else {
            return;
        };
        let node = &self.arena[id];
        if level == 0 {
            row.push(node.record());
        } else {
            self.collect_level(node.left, level - 1, row);
            self.collect_level(node.right, level - 1, row);
        }
    }
}

impl<'a, B: Rebalance> IntoIterator for &'a SearchTree<B> {
    type Item = &'a Record;
    type IntoIter = InOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.in_order()
    }
}
