//! Data structure representing an arena tree in which the arena is sorted in depth-first
//! order for faster access. Parents are always stored before their children and every
//! sub-tree occupies a contiguous slice of the arena.

use super::{utils::permute, ArenaIndex, ArenaNode, DirectedArenaTree};
use itertools::Itertools;
use std::{fmt::Debug, hash::Hash};

#[derive(Debug, Clone)]
pub struct DepthFirstArenaTree<Load, NodeId>(DirectedArenaTree<Load, NodeId>);

impl<Load, NodeId> From<DirectedArenaTree<Load, NodeId>> for DepthFirstArenaTree<Load, NodeId>
where
    NodeId: Eq + Clone + Hash + Debug,
{
    fn from(mut value: DirectedArenaTree<Load, NodeId>) -> Self {
        // sorts the order of nodes such that depth-first decent is optimal
        let optimal_order = value.iter_depth().map(|node| node.index).collect_vec();

        let mut new_indices = vec![ArenaIndex(usize::MAX); value.nodes.len()];
        optimal_order
            .iter()
            .enumerate()
            .for_each(|(new, old)| new_indices[old.0] = ArenaIndex(new));

        value.nodes = permute(value.nodes, &optimal_order);
        value.lookup.clear();
        for node in value.nodes.iter_mut() {
            node.index = new_indices[node.index.0];
            node.parent_ref = node.parent_ref.map(|parent| new_indices[parent.0]);
            node.children
                .iter_mut()
                .for_each(|child| *child = new_indices[child.0]);
            value.lookup.insert(node.id.clone(), node.index);
        }
        Self(value)
    }
}

impl<Load, NodeId> Default for DepthFirstArenaTree<Load, NodeId>
where
    NodeId: Eq + Clone + Hash + Debug,
{
    fn default() -> Self {
        Self(DirectedArenaTree::new())
    }
}

impl<Load, NodeId> DepthFirstArenaTree<Load, NodeId>
where
    NodeId: Eq + Clone + Hash + Debug,
{
    /// Convert back into a tree that accepts new nodes
    pub fn into_directed(self) -> DirectedArenaTree<Load, NodeId> {
        self.0
    }

    pub fn nodes(&self) -> &[ArenaNode<Load, NodeId>] {
        &self.0.nodes
    }

    pub fn len(&self) -> usize {
        self.0.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&ArenaNode<Load, NodeId>> {
        self.0.nodes.first()
    }

    pub fn node(&self, index: ArenaIndex) -> Option<&ArenaNode<Load, NodeId>> {
        self.0.nodes.get(index.0)
    }

    pub fn node_mut(&mut self, index: ArenaIndex) -> Option<&mut ArenaNode<Load, NodeId>> {
        self.0.nodes.get_mut(index.0)
    }

    pub fn index_of(&self, node_id: &NodeId) -> Option<ArenaIndex> {
        self.0.lookup.get(node_id).copied()
    }

    pub fn node_by_id(&self, node_id: &NodeId) -> Option<&ArenaNode<Load, NodeId>> {
        self.0.node_by_id(node_id)
    }

    pub fn node_by_id_mut(&mut self, node_id: &NodeId) -> Option<&mut ArenaNode<Load, NodeId>> {
        self.0.node_by_id_mut(node_id)
    }

    /// Depth-first traversal. As the arena is sorted, this is a linear scan.
    pub fn iter(&self) -> std::slice::Iter<'_, ArenaNode<Load, NodeId>> {
        self.0.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ArenaNode<Load, NodeId>> {
        self.0.nodes.iter_mut()
    }

    /// The sub-tree rooted at `root` (including `root`), in depth-first order
    pub fn iter_sub(&self, root: ArenaIndex) -> std::slice::Iter<'_, ArenaNode<Load, NodeId>> {
        let width = self.0.nodes.get(root.0).map_or(0, |node| node.width);
        self.0.nodes[root.0.min(self.0.nodes.len())..][..width].iter()
    }

    /// Walks from `index` up to the root, excluding `index` itself
    pub fn ancestors(&self, index: ArenaIndex) -> impl Iterator<Item = ArenaIndex> + '_ {
        std::iter::successors(
            self.0.nodes.get(index.0).and_then(|node| node.parent_ref),
            |current| self.0.nodes[current.0].parent_ref,
        )
    }

    /// Whether `ancestor` lies on the path from `index` to the root (or is `index`)
    pub fn is_ancestor(&self, ancestor: ArenaIndex, index: ArenaIndex) -> bool {
        self.0
            .nodes
            .get(ancestor.0)
            .is_some_and(|node| ancestor <= index && index.0 < ancestor.0 + node.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Nodelike;

    fn tree() -> DepthFirstArenaTree<&'static str, u32> {
        let mut directed = DirectedArenaTree::new();
        directed.set_root("root", 0);
        directed.add("a", 1, &0).unwrap();
        directed.add("b", 2, &0).unwrap();
        directed.add("a1", 3, &1).unwrap();
        directed.add("b1", 4, &2).unwrap();
        directed.add("a2", 5, &1).unwrap();
        directed.into()
    }

    #[test]
    fn sorted_depth_first() {
        let tree = tree();
        let loads = tree.iter().map(|node| *node.get()).collect_vec();
        assert_eq!(loads, vec!["root", "a", "a1", "a2", "b", "b1"]);
        for node in tree.iter().skip(1) {
            assert!(node.parent().unwrap() < node.index());
        }
        assert_eq!(tree.index_of(&4), Some(ArenaIndex(5)));
        assert_eq!(tree.node(ArenaIndex(4)).unwrap().children(), &[ArenaIndex(5)]);
    }

    #[test]
    fn reverse_visits_children_before_parents() {
        let tree = tree();
        let mut visited = vec![false; tree.len()];
        for node in tree.iter().skip(1).rev() {
            assert!(node.children().iter().all(|child| visited[child.0]));
            visited[node.index().0] = true;
        }
        assert_eq!(visited.iter().filter(|seen| **seen).count(), tree.len() - 1);
    }

    #[test]
    fn sub_trees_and_ancestors() {
        let tree = tree();
        let a = tree.index_of(&1).unwrap();
        let sub = tree.iter_sub(a).map(|node| node.id()).collect_vec();
        assert_eq!(sub, vec![1, 3, 5]);
        let b1 = tree.index_of(&4).unwrap();
        assert_eq!(
            tree.ancestors(b1).collect_vec(),
            vec![ArenaIndex(4), ArenaIndex(0)]
        );
        assert!(tree.is_ancestor(a, tree.index_of(&5).unwrap()));
        assert!(!tree.is_ancestor(a, b1));
    }

    #[test]
    fn errors_on_invalid_edits() {
        let mut directed = tree().into_directed();
        assert!(matches!(
            directed.add("x", 1, &0),
            Err(crate::DynamicsError::TopologyViolation(_))
        ));
        assert!(matches!(
            directed.add("x", 9, &42),
            Err(crate::DynamicsError::UnknownEntity { .. })
        ));
        directed.add("c", 6, &0).unwrap();
        let tree: DepthFirstArenaTree<_, _> = directed.into();
        assert_eq!(tree.root().unwrap().width(), 7);
        assert_eq!(tree.iter().last().unwrap().id(), 6);
    }
}
