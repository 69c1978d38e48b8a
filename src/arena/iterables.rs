//! Definition of the interfaces for tree nodes

/// Container that holds data (the load) in an arena tree
pub trait Nodelike<Load, NodeId> {
    fn get(&self) -> &Load;

    fn id(&self) -> NodeId;
    /// Get the node's distance to its root node. Required for indentation and accumulations.
    fn depth(&self) -> usize;
}
