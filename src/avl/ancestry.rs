//! Ancestry and introspection queries
//!
//! Nodes store no parent links, so every query here re-descends from the
//! root by key. Each is O(height). The root is at level 0.

use std::cmp::Ordering;

use serde::Serialize;

use super::error::{TreeError, TreeResult};
use super::node::NodeId;
use super::{Rebalance, SearchTree, Tolerance};
use crate::record::{Key, Record};

/// Everything known about one node's position in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub record: Record,
    pub level: usize,
    pub balance: i32,
    pub parent: Option<Record>,
    pub grandparent: Option<Record>,
    pub uncle: Option<Record>,
}

impl<B: Rebalance> SearchTree<B> {
    fn require_root(&self) -> TreeResult<NodeId> {
        self.root.ok_or(TreeError::EmptyTree)
    }

    /// Depth of the node holding `key`, the root being level 0
    ///
    /// # Errors
    /// * `TreeError::EmptyTree` - the tree has no nodes
    pub fn level_of(&self, key: Key) -> TreeResult<Option<usize>> {
        let mut current = Some(self.require_root()?);
        let mut level = 0;

        while let Some(id) = current {
            let node = &self.arena[id];
            current = match key.partial_cmp(&node.key()) {
                Some(Ordering::Equal) => return Ok(Some(level)),
                Some(Ordering::Less) => node.left,
                Some(Ordering::Greater) => node.right,
                None => return Ok(None),
            };
            level += 1;
        }
        Ok(None)
    }

    /// Balance factor of the node holding `key`
    pub fn balance_of(&self, key: Key) -> TreeResult<Option<i32>> {
        self.require_root()?;
        Ok(self
            .find(key)
            .map(|id| self.arena.balance_factor(Some(id))))
    }

    /// Record whose node has the node holding `key` as a child
    ///
    /// `None` if `key` is the root's key or is not stored.
    pub fn parent_of(&self, key: Key) -> TreeResult<Option<&Record>> {
        Ok(self
            .find_parent(key)?
            .map(|id| self.arena[id].record()))
    }

    /// Parent of the parent of the node holding `key`
    pub fn grandparent_of(&self, key: Key) -> TreeResult<Option<&Record>> {
        Ok(self
            .find_grandparent(key)?
            .map(|(grandparent, _)| self.arena[grandparent].record()))
    }

    /// The grandparent's child that is not the parent
    ///
    /// `None` when there is no grandparent or the grandparent has a single child.
    pub fn uncle_of(&self, key: Key) -> TreeResult<Option<&Record>> {
        let Some((grandparent, parent)) = self.find_grandparent(key)? else {
            return Ok(None);
        };

        let node = &self.arena[grandparent];
        let uncle = if node.left == Some(parent) {
            node.right
        } else {
            node.left
        };
        Ok(uncle.map(|id| self.arena[id].record()))
    }

    /// Level, balance factor and relatives of the node matching `key`
    ///
    /// `key` is resolved with [`SearchTree::search_within`]; the relatives are
    /// then looked up with the stored key, exactly.
    pub fn node_info(&self, key: Key, tolerance: Tolerance) -> TreeResult<Option<NodeInfo>> {
        self.require_root()?;
        let Some(record) = self.search_within(key, tolerance) else {
            return Ok(None);
        };
        let key = record.key();

        let Some(level) = self.level_of(key)? else {
            return Ok(None);
        };

        Ok(Some(NodeInfo {
            record: record.clone(),
            level,
            balance: self.balance_of(key)?.unwrap_or(0),
            parent: self.parent_of(key)?.cloned(),
            grandparent: self.grandparent_of(key)?.cloned(),
            uncle: self.uncle_of(key)?.cloned(),
        }))
    }

    /// Find the node one of whose children holds `key`
    fn find_parent(&self, key: Key) -> TreeResult<Option<NodeId>> {
        let mut current = Some(self.require_root()?);

        while let Some(id) = current {
            let node = &self.arena[id];
            let holds_key = |child: Option<NodeId>| child.is_some_and(|c| self.arena[c].key() == key);

            if holds_key(node.left) || holds_key(node.right) {
                return Ok(Some(id));
            }

            current = match key.partial_cmp(&node.key()) {
                Some(Ordering::Less) => node.left,
                Some(Ordering::Greater) => node.right,
                Some(Ordering::Equal) | None => None,
            };
        }
        Ok(None)
    }

    /// Returns `(grandparent, parent)` of the node holding `key`
    fn find_grandparent(&self, key: Key) -> TreeResult<Option<(NodeId, NodeId)>> {
        let Some(parent) = self.find_parent(key)? else {
            return Ok(None);
        };
        let parent_key = self.arena[parent].key();
        Ok(self.find_parent(parent_key)?.map(|gp| (gp, parent)))
    }
}
