//! Paths between two bodies of the kinematic tree.

use super::Mechanism;
use crate::{
    arena::ArenaIndex,
    body::BodyId,
    errors::{DynamicsError, Result},
    joint::JointId,
    Scalar,
};
use itertools::Itertools;

/// Direction in which a joint is traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDirection {
    /// From successor to predecessor (towards the root)
    Up,
    /// From predecessor to successor (away from the root)
    Down,
}

impl PathDirection {
    /// Factor applied to the joint's motion subspace along the path
    pub fn sign<T: Scalar>(&self) -> T {
        match self {
            PathDirection::Up => -T::one(),
            PathDirection::Down => T::one(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEdge {
    pub joint: JointId,
    pub direction: PathDirection,
    /// Arena index of the joint's successor
    pub(crate) index: ArenaIndex,
}

/// Sequence of tree joints from `source` to `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePath {
    source: BodyId,
    target: BodyId,
    edges: Vec<PathEdge>,
}

impl TreePath {
    pub fn source(&self) -> BodyId {
        self.source
    }

    pub fn target(&self) -> BodyId {
        self.target
    }

    pub fn edges(&self) -> &[PathEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn direction(&self, joint: JointId) -> Option<PathDirection> {
        self.edges
            .iter()
            .find(|edge| edge.joint == joint)
            .map(|edge| edge.direction)
    }
}

impl<T: Scalar> Mechanism<T> {
    /// The path through the tree from `from` to `to`: up to their lowest common ancestor, then
    /// down to `to`
    pub fn path(&self, from: BodyId, to: BodyId) -> Result<TreePath> {
        let (source, target) = (self.index_of(from)?, self.index_of(to)?);
        let common = std::iter::once(source)
            .chain(self.tree.ancestors(source))
            .find(|ancestor| self.tree.is_ancestor(*ancestor, target))
            .ok_or_else(|| DynamicsError::TopologyViolation(format!("{from} and {to} are not connected")))?;

        let edge = |index: ArenaIndex, direction| -> Result<PathEdge> {
            let joint = self.node(index)?.load().joint.as_ref().ok_or_else(|| {
                DynamicsError::TopologyViolation(format!("{index:?} has no joint to its parent"))
            })?;
            Ok(PathEdge {
                joint: joint.id(),
                direction,
                index,
            })
        };
        let up = std::iter::once(source)
            .chain(self.tree.ancestors(source))
            .take_while(|index| *index != common)
            .map(|index| edge(index, PathDirection::Up));
        let down = std::iter::once(target)
            .chain(self.tree.ancestors(target))
            .take_while(|index| *index != common)
            .collect_vec()
            .into_iter()
            .rev()
            .map(|index| edge(index, PathDirection::Down));

        Ok(TreePath {
            source: from,
            target: to,
            edges: up.chain(down).collect::<Result<_>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{body::RigidBody, joint::Joint, joint::JointType};
    use nalgebra::Vector3;

    #[test]
    fn path_through_common_ancestor() {
        let mut mechanism = Mechanism::<f64>::new(RigidBody::massless("world"));
        let world = mechanism.root_body().id();
        let hinge = || JointType::revolute(Vector3::z());
        let (a, b, c) = (
            RigidBody::massless("a"),
            RigidBody::massless("b"),
            RigidBody::massless("c"),
        );
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
        mechanism.add_body(world, Joint::new("ja", hinge()), a).unwrap();
        mechanism.add_body(a_id, Joint::new("jb", hinge()), b).unwrap();
        mechanism.add_body(a_id, Joint::new("jc", hinge()), c).unwrap();

        let path = mechanism.path(b_id, c_id).unwrap();
        let joints = path
            .edges()
            .iter()
            .map(|edge| (mechanism.joint(edge.joint).unwrap().name().to_string(), edge.direction))
            .collect_vec();
        assert_eq!(
            joints,
            vec![
                ("jb".to_string(), PathDirection::Up),
                ("jc".to_string(), PathDirection::Down)
            ]
        );
        let from_root = mechanism.path(world, c_id).unwrap();
        assert_eq!(from_root.len(), 2);
        assert_eq!(from_root.direction(from_root.edges()[0].joint), Some(PathDirection::Down));
        assert!(mechanism.path(c_id, c_id).unwrap().is_empty());
        assert_eq!(PathDirection::Up.sign::<f64>(), -1.0);
    }
}
