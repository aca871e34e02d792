use std::ops::{Index, IndexMut};

use crate::record::{Key, Record};

/// Node identifier (index into node storage)
pub type NodeId = usize;

/// Tree node: owns one record and links to its children
///
/// A node is reachable from exactly one place, its parent's `left`/`right`
/// slot or the tree root. No parent link is stored; ancestry is recomputed
/// by descending from the root.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) record: Record,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl Node {
    /// Create a new leaf node
    pub fn new(record: Record) -> Self {
        Self {
            record,
            left: None,
            right: None,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn key(&self) -> Key {
        self.record.key()
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Check if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Slot storage for tree nodes
///
/// Freed slots are recycled through a free list, so a `NodeId` is only
/// meaningful while the node it names is still linked into the tree.
#[derive(Debug, Default, Clone)]
pub struct NodeArena {
    nodes: Vec<Option<Node>>,
    free_list: Vec<NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn live(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Allocate a new node, returning its ID
    pub fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            let id = self.nodes.len();
            self.nodes.push(Some(node));
            id
        }
    }

    /// Free a node, returning its contents and recycling the slot
    pub fn free(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.get_mut(id)?.take()?;
        self.free_list.push(id);
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(|n| n.as_mut())
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
    }

    // ========== Height Conventions ==========

    /// Height used by the balancing layer: empty subtree = 0, leaf = 1
    ///
    /// Recomputed by walking the whole subtree; nothing is cached.
    pub fn avl_height(&self, id: Option<NodeId>) -> i32 {
        match id {
            None => 0,
            Some(id) => {
                let node = &self[id];
                1 + self.avl_height(node.left).max(self.avl_height(node.right))
            }
        }
    }

    /// Height used for diagnostics and level listings: empty = -1, leaf = 0
    pub fn diagnostic_height(&self, id: Option<NodeId>) -> i32 {
        match id {
            None => -1,
            Some(id) => {
                let node = &self[id];
                1 + self
                    .diagnostic_height(node.left)
                    .max(self.diagnostic_height(node.right))
            }
        }
    }

    /// `avl_height(left) - avl_height(right)`, 0 for an empty subtree
    pub fn balance_factor(&self, id: Option<NodeId>) -> i32 {
        match id {
            None => 0,
            Some(id) => {
                let node = &self[id];
                self.avl_height(node.left) - self.avl_height(node.right)
            }
        }
    }

    /// Number of nodes in the subtree rooted at `id`
    pub fn subtree_len(&self, id: Option<NodeId>) -> usize {
        match id {
            None => 0,
            Some(id) => {
                let node = &self[id];
                1 + self.subtree_len(node.left) + self.subtree_len(node.right)
            }
        }
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    /// Panics on a freed or out-of-range id; ids held by the tree are always live.
    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("dangling node id {id}"),
        }
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("dangling node id {id}"),
        }
    }
}
