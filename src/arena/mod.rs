//! [Arena memory allocated](https://en.wikipedia.org/wiki/Region-based_memory_management)
//! tree structures for fast depth-first traversal. Mechanisms store their bodies in a
//! [DepthFirstArenaTree] so that forward passes are plain scans and backward passes are
//! reversed scans over the arena.

pub mod depth;
pub mod directed;
pub mod iterables;
mod utils;

pub use depth::DepthFirstArenaTree;
pub use directed::{ArenaIndex, ArenaNode, DepthFirstIterator, DirectedArenaTree};
pub use iterables::Nodelike;
