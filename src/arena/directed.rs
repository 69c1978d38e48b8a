//! Implementation of a directionally iterable
//! [arena allocated](https://en.wikipedia.org/wiki/Region-based_memory_management)
//! tree in which nodes are stored in insertion order. Iteration follows references and is
//! therefore slower than iterating a [super::DepthFirstArenaTree].

use super::iterables::Nodelike;
use crate::errors::{DynamicsError, EntityKind, Result};
use core::fmt;
use std::{collections::HashMap, fmt::Debug, hash::Hash};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub struct ArenaIndex(pub usize);

/// A node structure to be used in an arena allocated tree. Fields are used to speed up iteration
#[derive(Debug, Clone)]
pub struct ArenaNode<Load, NodeId> {
    /// The user-defined load that the node owns
    pub(super) load: Load,
    /// Index in the arena allocation
    pub(super) index: ArenaIndex,
    /// identifier for lookups
    pub(super) id: NodeId,
    /// references for children
    pub(super) children: Vec<ArenaIndex>,
    /// Size of the sub-tree (including the node itself)
    pub(super) width: usize,
    /// Depth in the tree
    pub(super) depth: usize,
    pub(super) parent_ref: Option<ArenaIndex>,
}

impl<Load, NodeId> ArenaNode<Load, NodeId> {
    fn new(load: Load, id: NodeId, index: ArenaIndex, depth: usize, parent_ref: Option<ArenaIndex>) -> Self {
        ArenaNode {
            load,
            id,
            index,
            width: 1,
            children: vec![],
            depth,
            parent_ref,
        }
    }

    pub fn load(&self) -> &Load {
        &self.load
    }

    pub fn load_mut(&mut self) -> &mut Load {
        &mut self.load
    }

    pub fn into_load(self) -> Load {
        self.load
    }

    pub fn index(&self) -> ArenaIndex {
        self.index
    }

    pub fn parent(&self) -> Option<ArenaIndex> {
        self.parent_ref
    }

    pub fn children(&self) -> &[ArenaIndex] {
        &self.children
    }

    /// Number of nodes in the sub-tree rooted at this node
    pub fn width(&self) -> usize {
        self.width
    }
}

impl<Load, NodeId> Nodelike<Load, NodeId> for ArenaNode<Load, NodeId>
where
    NodeId: Clone,
{
    fn get(&self) -> &Load {
        &self.load
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn id(&self) -> NodeId {
        self.id.clone()
    }
}

impl<Load, NodeId> fmt::Display for ArenaNode<Load, NodeId>
where
    Load: fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Arena index {:?}, children: {:?}, load: {} ",
            self.index, self.children, self.load
        )
    }
}

/// Iterable tree that uses arena allocation and allows for
/// unoptimized (possibly slow) depth-first traversal.
/// Can be converted to a [super::DepthFirstArenaTree] with `into()`.
///
/// The tree is mutable, that is, adding nodes is possible, unlike in
/// the tree optimized for depth-first traversal.
#[derive(Debug, Clone)]
pub struct DirectedArenaTree<Load, NodeId> {
    /// Memory allocated area for nodes
    pub(super) nodes: Vec<ArenaNode<Load, NodeId>>,

    /// Lookup arena indices
    pub(super) lookup: HashMap<NodeId, ArenaIndex>,
}

impl<Load, NodeId> DirectedArenaTree<Load, NodeId>
where
    NodeId: Eq + Clone + Hash + Debug,
{
    pub fn new() -> Self {
        DirectedArenaTree {
            nodes: vec![],
            lookup: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DirectedArenaTree {
            nodes: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    /// Deletes all nodes and sets a new root
    pub fn set_root(&mut self, root_load: Load, root_id: NodeId) -> ArenaIndex {
        self.nodes.clear();
        self.lookup.clear();
        self.nodes
            .push(ArenaNode::new(root_load, root_id.clone(), ArenaIndex(0), 0, None));
        self.lookup.insert(root_id, ArenaIndex(0));
        ArenaIndex(0)
    }

    /// Add a new node as the last child of `parent`
    pub fn add(&mut self, load: Load, node_id: NodeId, parent: &NodeId) -> Result<ArenaIndex> {
        let parent_index = *self
            .lookup
            .get(parent)
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Body, format!("{parent:?}")))?;

        // First check whether we can add the node (id not used yet)
        if self.lookup.contains_key(&node_id) {
            return Err(DynamicsError::TopologyViolation(format!(
                "{node_id:?} is already part of the tree"
            )));
        }
        let index = ArenaIndex(self.nodes.len());

        // * update the parent's and its ancestors' widths
        // * add the node as a child
        let depth = self.nodes[parent_index.0].depth + 1;
        self.nodes[parent_index.0].children.push(index);
        let mut ancestor = Some(parent_index);
        while let Some(current) = ancestor {
            let node = &mut self.nodes[current.0];
            node.width += 1;
            ancestor = node.parent_ref;
        }

        self.lookup.insert(node_id.clone(), index);
        self.nodes
            .push(ArenaNode::new(load, node_id, index, depth, Some(parent_index)));
        Ok(index)
    }

    pub fn node_by_id(&self, node_id: &NodeId) -> Option<&ArenaNode<Load, NodeId>> {
        let index = self.lookup.get(node_id)?;
        self.nodes.get(index.0)
    }

    pub fn node_by_id_mut(&mut self, node_id: &NodeId) -> Option<&mut ArenaNode<Load, NodeId>> {
        let index = self.lookup.get(node_id)?;
        self.nodes.get_mut(index.0)
    }

    pub fn nodes(&self) -> &[ArenaNode<Load, NodeId>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first traversal following child references, starting at the root
    pub fn iter_depth(&self) -> DepthFirstIterator<'_, Load, NodeId> {
        DepthFirstIterator::new(self, ArenaIndex(0))
    }
}

impl<Load, NodeId> Default for DirectedArenaTree<Load, NodeId>
where
    NodeId: Eq + Clone + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator for a depth-first iteration when the data is not already sorted accordingly
pub struct DepthFirstIterator<'a, Load, NodeId> {
    tree: &'a DirectedArenaTree<Load, NodeId>,
    stack: Vec<std::slice::Iter<'a, ArenaIndex>>,
    root: Option<ArenaIndex>,
}

impl<'a, Load, NodeId> DepthFirstIterator<'a, Load, NodeId> {
    pub fn new(tree: &'a DirectedArenaTree<Load, NodeId>, root: ArenaIndex) -> Self {
        DepthFirstIterator {
            tree,
            stack: vec![],
            root: if root.0 < tree.nodes.len() { Some(root) } else { None },
        }
    }
}

impl<'a, Load, NodeId> Iterator for DepthFirstIterator<'a, Load, NodeId> {
    type Item = &'a ArenaNode<Load, NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            let root = &self.tree.nodes[root.0];
            self.stack.push(root.children.iter());
            return Some(root);
        }
        while let Some(last) = self.stack.last_mut() {
            if let Some(child_ref) = last.next() {
                let node = &self.tree.nodes[child_ref.0];
                self.stack.push(node.children.iter());
                return Some(node);
            }
            self.stack.pop();
        }
        None
    }
}
