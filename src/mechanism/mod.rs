//! The mechanism: a kinematic tree of [RigidBody]s connected by [Joint]s, rooted at a fixed world
//! body, plus any number of non-tree (loop) joints.
//!
//! Bodies are stored in a [DepthFirstArenaTree] keyed by [BodyId]: a parent always precedes its
//! children and every sub-tree is a contiguous slice. The configuration and velocity vectors
//! are the concatenation of the tree joints' blocks in that order.

mod description;
mod edit;
mod path;

pub use description::{InertialDescription, LinkDescription};
pub use path::{PathDirection, PathEdge, TreePath};

use crate::{
    arena::{ArenaIndex, ArenaNode, DepthFirstArenaTree, DirectedArenaTree, Nodelike},
    body::{BodyId, RigidBody},
    errors::{DynamicsError, EntityKind, Result},
    joint::{Joint, JointId},
    scalar::lit,
    spatial::{CoordinateFrame, FreeVector3D, SpatialInertia, Transform3D},
    Scalar,
};
use nalgebra::Vector3;
use std::{collections::HashMap, fmt, ops::Range};

/// Load of the mechanism's arena: a body and the joint connecting it to its parent
#[derive(Debug, Clone)]
pub struct TreeNode<T: Scalar> {
    pub(crate) body: RigidBody<T>,
    pub(crate) joint: Option<Joint<T>>,
}

impl<T: Scalar> TreeNode<T> {
    pub fn body(&self) -> &RigidBody<T> {
        &self.body
    }

    /// The joint to the parent; `None` for the root
    pub fn joint(&self) -> Option<&Joint<T>> {
        self.joint.as_ref()
    }

    pub(crate) fn tree_joint(&self) -> Result<&Joint<T>> {
        self.joint
            .as_ref()
            .ok_or_else(|| DynamicsError::TopologyViolation(format!("{} has no joint to its parent", self.body)))
    }
}

/// Arena index of the parent of a non-root node
pub(crate) fn parent_index<T: Scalar>(node: &ArenaNode<TreeNode<T>, BodyId>) -> Result<usize> {
    node.parent()
        .map(|parent| parent.0)
        .ok_or_else(|| DynamicsError::TopologyViolation(format!("{} has no parent", node.load().body)))
}

/// A joint closing a kinematic loop between two bodies of the tree
#[derive(Debug, Clone)]
pub struct LoopJoint<T: Scalar> {
    pub(crate) joint: Joint<T>,
    pub(crate) predecessor: BodyId,
    pub(crate) successor: BodyId,
}

impl<T: Scalar> LoopJoint<T> {
    pub fn joint(&self) -> &Joint<T> {
        &self.joint
    }

    pub fn predecessor(&self) -> BodyId {
        self.predecessor
    }

    pub fn successor(&self) -> BodyId {
        self.successor
    }
}

/// Per tree node data derived from the bodies and joints, recomputed after every edit
#[derive(Debug, Clone)]
pub(crate) struct Segment<T: Scalar> {
    pub(crate) q_start: usize,
    pub(crate) v_start: usize,
    /// `frame_before` of the joint to the predecessor's default frame
    pub(crate) before_to_predecessor: Transform3D<T>,
    /// Successor's default frame to `frame_after` of the joint
    pub(crate) successor_to_after: Transform3D<T>,
}

impl<T: Scalar> Segment<T> {
    fn root(frame: CoordinateFrame) -> Self {
        Segment {
            q_start: 0,
            v_start: 0,
            before_to_predecessor: Transform3D::identity(frame),
            successor_to_after: Transform3D::identity(frame),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mechanism<T: Scalar> {
    tree: DepthFirstArenaTree<TreeNode<T>, BodyId>,
    loops: Vec<LoopJoint<T>>,
    /// Expressed in the root frame
    gravity: Vector3<T>,
    segments: Vec<Segment<T>>,
    joint_lookup: HashMap<JointId, ArenaIndex>,
    frame_owner: HashMap<CoordinateFrame, BodyId>,
    num_positions: usize,
    num_velocities: usize,
}

impl<T: Scalar> Mechanism<T> {
    /// A mechanism that consists of the (fixed) root body only. Gravity defaults to
    /// `(0, 0, -9.81)` in the root frame.
    pub fn new(root: RigidBody<T>) -> Self {
        let root_frame = root.default_frame();
        let root_id = root.id();
        let mut directed = DirectedArenaTree::new();
        directed.set_root(TreeNode { body: root, joint: None }, root_id);
        let tree: DepthFirstArenaTree<_, _> = directed.into();
        let frame_owner = frame_owners(&tree);
        Mechanism {
            tree,
            loops: vec![],
            gravity: Vector3::new(T::zero(), T::zero(), lit(-9.81)),
            segments: vec![Segment::root(root_frame)],
            joint_lookup: HashMap::new(),
            frame_owner,
            num_positions: 0,
            num_velocities: 0,
        }
    }

    /// Recomputes lookups, coordinate offsets and joint poses after a structural edit
    fn rebuild(&mut self) -> Result<()> {
        self.frame_owner = frame_owners(&self.tree);
        self.joint_lookup = self
            .tree
            .iter()
            .filter_map(|node| node.load().joint.as_ref().map(|joint| (joint.id(), node.index())))
            .collect();

        let (mut q_start, mut v_start) = (0, 0);
        let mut segments = Vec::with_capacity(self.tree.len());
        for node in self.tree.iter() {
            let TreeNode { body, joint } = node.load();
            let segment = match (joint, node.parent().and_then(|parent| self.tree.node(parent))) {
                (Some(joint), Some(parent)) => Segment {
                    q_start,
                    v_start,
                    before_to_predecessor: *parent.load().body.frame_definition(joint.frame_before())?,
                    successor_to_after: body.frame_definition(joint.frame_after())?.inverse(),
                },
                _ => Segment::root(body.default_frame()),
            };
            if let Some(joint) = joint {
                q_start += joint.num_positions();
                v_start += joint.num_velocities();
            }
            segments.push(segment);
        }
        self.segments = segments;
        self.num_positions = q_start;
        self.num_velocities = v_start;
        Ok(())
    }

    pub(crate) fn tree(&self) -> &DepthFirstArenaTree<TreeNode<T>, BodyId> {
        &self.tree
    }

    pub(crate) fn segments(&self) -> &[Segment<T>] {
        &self.segments
    }

    pub(crate) fn node(&self, index: ArenaIndex) -> Result<&ArenaNode<TreeNode<T>, BodyId>> {
        self.tree
            .node(index)
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Body, format!("{index:?}")))
    }

    pub(crate) fn index_of(&self, body: BodyId) -> Result<ArenaIndex> {
        self.tree
            .index_of(&body)
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Body, body))
    }

    /// Arena index of the successor of a tree joint
    pub(crate) fn joint_index(&self, joint: JointId) -> Result<ArenaIndex> {
        self.joint_lookup
            .get(&joint)
            .copied()
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Joint, joint))
    }

    pub(crate) fn frame_index(&self, frame: CoordinateFrame) -> Result<ArenaIndex> {
        self.index_of(self.frame_owner(frame)?)
    }

    pub fn root_body(&self) -> &RigidBody<T> {
        // The tree always contains the root
        &self.tree.nodes()[0].load().body
    }

    pub fn root_frame(&self) -> CoordinateFrame {
        self.root_body().default_frame()
    }

    /// Bodies in depth-first tree order, starting with the root
    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody<T>> {
        self.tree.iter().map(|node| &node.load().body)
    }

    pub fn num_bodies(&self) -> usize {
        self.tree.len()
    }

    /// Tree joints in depth-first order, which is also the coordinate order
    pub fn tree_joints(&self) -> impl Iterator<Item = &Joint<T>> {
        self.tree.iter().filter_map(|node| node.load().joint.as_ref())
    }

    pub fn non_tree_joints(&self) -> &[LoopJoint<T>] {
        &self.loops
    }

    pub fn body(&self, id: BodyId) -> Result<&RigidBody<T>> {
        Ok(&self.node(self.index_of(id)?)?.load().body)
    }

    pub fn find_body(&self, name: &str) -> Result<&RigidBody<T>> {
        self.bodies()
            .find(|body| body.name() == name)
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Body, name))
    }

    /// Tree or non-tree joint by id
    pub fn joint(&self, id: JointId) -> Result<&Joint<T>> {
        self.tree_joints()
            .chain(self.loops.iter().map(|lj| &lj.joint))
            .find(|joint| joint.id() == id)
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Joint, id))
    }

    pub fn find_joint(&self, name: &str) -> Result<&Joint<T>> {
        self.tree_joints()
            .chain(self.loops.iter().map(|lj| &lj.joint))
            .find(|joint| joint.name() == name)
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Joint, name))
    }

    pub fn is_tree_joint(&self, id: JointId) -> bool {
        self.joint_lookup.contains_key(&id)
    }

    /// The joint connecting `body` to its parent, `None` for the root
    pub fn joint_to_parent(&self, body: BodyId) -> Result<Option<&Joint<T>>> {
        Ok(self.node(self.index_of(body)?)?.load().joint.as_ref())
    }

    pub fn parent(&self, body: BodyId) -> Result<Option<&RigidBody<T>>> {
        let node = self.node(self.index_of(body)?)?;
        node.parent()
            .map(|parent| self.node(parent).map(|parent| &parent.load().body))
            .transpose()
    }

    pub fn children(&self, body: BodyId) -> Result<Vec<&RigidBody<T>>> {
        let node = self.node(self.index_of(body)?)?;
        node.children()
            .iter()
            .map(|child| self.node(*child).map(|child| &child.load().body))
            .collect()
    }

    pub fn predecessor(&self, joint: JointId) -> Result<&RigidBody<T>> {
        if let Some(loop_joint) = self.loops.iter().find(|lj| lj.joint.id() == joint) {
            return self.body(loop_joint.predecessor);
        }
        let node = self.node(self.joint_index(joint)?)?;
        let parent = node
            .parent()
            .ok_or_else(|| DynamicsError::TopologyViolation(format!("{joint} has no predecessor")))?;
        Ok(&self.node(parent)?.load().body)
    }

    pub fn successor(&self, joint: JointId) -> Result<&RigidBody<T>> {
        if let Some(loop_joint) = self.loops.iter().find(|lj| lj.joint.id() == joint) {
            return self.body(loop_joint.successor);
        }
        Ok(&self.node(self.joint_index(joint)?)?.load().body)
    }

    /// The body a frame is rigidly attached to
    pub fn frame_owner(&self, frame: CoordinateFrame) -> Result<BodyId> {
        self.frame_owner
            .get(&frame)
            .copied()
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Frame, frame))
    }

    pub fn num_positions(&self) -> usize {
        self.num_positions
    }

    pub fn num_velocities(&self) -> usize {
        self.num_velocities
    }

    /// Range of the joint's block in the configuration vector
    pub fn q_range(&self, joint: JointId) -> Result<Range<usize>> {
        let index = self.joint_index(joint)?;
        let start = self.segments[index.0].q_start;
        Ok(start..start + self.joint(joint)?.num_positions())
    }

    /// Range of the joint's block in the velocity vector
    pub fn v_range(&self, joint: JointId) -> Result<Range<usize>> {
        let index = self.joint_index(joint)?;
        let start = self.segments[index.0].v_start;
        Ok(start..start + self.joint(joint)?.num_velocities())
    }

    pub fn gravity(&self) -> FreeVector3D<T> {
        FreeVector3D::new(self.root_frame(), self.gravity)
    }

    pub fn set_gravity(&mut self, gravity: &FreeVector3D<T>) -> Result<()> {
        crate::spatial::check_frames(self.root_frame(), gravity.frame())?;
        self.gravity = *gravity.coords();
        Ok(())
    }

    /// Replaces the inertia of a body (expressed in its default frame)
    pub fn set_inertia(&mut self, body: BodyId, inertia: Option<SpatialInertia<T>>) -> Result<()> {
        let index = self.index_of(body)?;
        self.tree
            .node_mut(index)
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Body, body))?
            .load_mut()
            .body
            .set_inertia(inertia)
    }

    /// Sum of all body masses, including the root's if it carries an inertia
    pub fn total_mass(&self) -> T {
        self.bodies()
            .filter_map(|body| body.inertia())
            .fold(T::zero(), |mass, inertia| mass + inertia.mass())
    }
}

fn frame_owners<T: Scalar>(tree: &DepthFirstArenaTree<TreeNode<T>, BodyId>) -> HashMap<CoordinateFrame, BodyId> {
    tree.iter()
        .flat_map(|node| {
            let body = &node.load().body;
            body.frame_definitions().iter().map(move |def| (def.from(), body.id()))
        })
        .collect()
}

impl<T: Scalar> fmt::Display for Mechanism<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.tree.iter() {
            let TreeNode { body, joint } = node.get();
            write!(f, "{:indent$}{}", "", body, indent = 2 * node.depth())?;
            match joint {
                Some(joint) => writeln!(f, " <- {joint}")?,
                None => writeln!(f)?,
            }
        }
        for loop_joint in self.loops.iter() {
            let (predecessor, successor) = (
                self.body(loop_joint.predecessor).map_err(|_| fmt::Error)?,
                self.body(loop_joint.successor).map_err(|_| fmt::Error)?,
            );
            writeln!(f, "loop: {predecessor} -> {successor} via {}", loop_joint.joint)?;
        }
        Ok(())
    }
}
