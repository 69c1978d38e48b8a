//! Structural edits of a [Mechanism]: attaching bodies and loop joints, merging bodies connected
//! by fixed joints, converting to maximal coordinates and extracting sub-mechanisms.

use super::{LoopJoint, Mechanism, TreeNode};
use crate::{
    arena::{DepthFirstArenaTree, DirectedArenaTree},
    body::{BodyId, RigidBody},
    errors::{DynamicsError, EntityKind, Result},
    joint::{Joint, JointType},
    spatial::{check_frames, Transform3D},
    Scalar,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

impl<T: Scalar> Mechanism<T> {
    /// Attaches `successor` to the tree via `joint`.
    ///
    /// * `joint_pose` maps `frame_before` of the joint to a frame attached to `predecessor`
    /// * `successor_pose` maps the default frame of `successor` to `frame_after` of the joint
    pub fn attach(
        &mut self,
        predecessor: BodyId,
        joint: Joint<T>,
        mut successor: RigidBody<T>,
        joint_pose: Transform3D<T>,
        successor_pose: Transform3D<T>,
    ) -> Result<()> {
        let predecessor_index = self.index_of(predecessor)?;
        if self.tree.index_of(&successor.id()).is_some() {
            return Err(DynamicsError::TopologyViolation(format!(
                "{successor} is already part of the mechanism"
            )));
        }
        self.check_new_joint(&joint)?;
        self.check_joint_pose(predecessor, &joint, &joint_pose)?;
        check_frames(successor.default_frame(), successor_pose.from())?;
        check_frames(joint.frame_after(), successor_pose.to())?;
        successor.resolve_frame(&successor_pose.inverse())?;
        if let Some(owner) = self.frame_owner.get(&successor.default_frame()) {
            return Err(DynamicsError::TopologyViolation(format!(
                "frame {} of {successor} is already attached to {owner}",
                successor.default_frame()
            )));
        }

        debug!("Attaching {successor} to {predecessor} via {joint}");
        successor.add_frame(successor_pose.inverse())?;
        if let Some(node) = self.tree.node_mut(predecessor_index) {
            node.load_mut().body.add_frame(joint_pose)?;
        }
        let successor_id = successor.id();
        let mut directed = std::mem::take(&mut self.tree).into_directed();
        let added = directed.add(
            TreeNode {
                body: successor,
                joint: Some(joint),
            },
            successor_id,
            &predecessor,
        );
        self.tree = directed.into();
        added?;
        self.rebuild()
    }

    /// Attaches `child` to `parent` with `frame_before` coinciding with the parent's default
    /// frame and `frame_after` coinciding with the child's default frame
    pub fn add_body(&mut self, parent: BodyId, joint: Joint<T>, child: RigidBody<T>) -> Result<()> {
        let parent_frame = self.body(parent)?.default_frame();
        let joint_pose = Transform3D::identity_between(joint.frame_before(), parent_frame);
        let successor_pose = Transform3D::identity_between(child.default_frame(), joint.frame_after());
        self.attach(parent, joint, child, joint_pose, successor_pose)
    }

    /// Adds a joint closing a kinematic loop between two bodies already in the tree. The poses
    /// follow the conventions of [Mechanism::attach].
    pub fn attach_loop(
        &mut self,
        predecessor: BodyId,
        successor: BodyId,
        joint: Joint<T>,
        joint_pose: Transform3D<T>,
        successor_pose: Transform3D<T>,
    ) -> Result<()> {
        let successor_index = self.index_of(successor)?;
        self.index_of(predecessor)?;
        self.check_new_joint(&joint)?;
        self.check_joint_pose(predecessor, &joint, &joint_pose)?;
        let successor_body = self.body(successor)?;
        check_frames(successor_body.default_frame(), successor_pose.from())?;
        check_frames(joint.frame_after(), successor_pose.to())?;
        successor_body.resolve_frame(&successor_pose.inverse())?;
        if let Some(owner) = self.frame_owner.get(&joint.frame_after()) {
            if *owner != successor {
                return Err(DynamicsError::TopologyViolation(format!(
                    "frame {} is already attached to {owner}",
                    joint.frame_after()
                )));
            }
        }

        debug!("Closing loop {predecessor} -> {successor} via {joint}");
        let predecessor_index = self.index_of(predecessor)?;
        if let Some(node) = self.tree.node_mut(predecessor_index) {
            node.load_mut().body.add_frame(joint_pose)?;
        }
        if let Some(node) = self.tree.node_mut(successor_index) {
            node.load_mut().body.add_frame(successor_pose.inverse())?;
        }
        self.loops.push(LoopJoint {
            joint,
            predecessor,
            successor,
        });
        self.rebuild()
    }

    fn check_new_joint(&self, joint: &Joint<T>) -> Result<()> {
        joint.joint_type().check_axes()?;
        if self.joint(joint.id()).is_ok() {
            return Err(DynamicsError::TopologyViolation(format!(
                "{} is already part of the mechanism",
                joint.id()
            )));
        }
        Ok(())
    }

    fn check_joint_pose(&self, predecessor: BodyId, joint: &Joint<T>, joint_pose: &Transform3D<T>) -> Result<()> {
        check_frames(joint.frame_before(), joint_pose.from())?;
        let predecessor_body = self.body(predecessor)?;
        if !predecessor_body.is_attached(joint_pose.to()) {
            return Err(DynamicsError::FrameMismatch {
                expected: predecessor_body.default_frame(),
                actual: joint_pose.to(),
            });
        }
        predecessor_body.resolve_frame(joint_pose)?;
        if let Some(owner) = self.frame_owner.get(&joint.frame_before()) {
            if *owner != predecessor {
                return Err(DynamicsError::TopologyViolation(format!(
                    "frame {} is already attached to {owner}",
                    joint.frame_before()
                )));
            }
        }
        Ok(())
    }

    /// Merges every body attached through a fixed joint into its predecessor. Frame definitions
    /// and inertia of the merged body move to the predecessor and its children are reattached
    /// there. Non-tree joints are kept and refer to the merged bodies.
    pub fn remove_fixed_joints(&self) -> Result<Mechanism<T>> {
        let mut merged_into = HashMap::<BodyId, BodyId>::with_capacity(self.tree.len());
        let lookup = |merged_into: &HashMap<BodyId, BodyId>, body: BodyId| {
            merged_into
                .get(&body)
                .copied()
                .ok_or_else(|| DynamicsError::unknown(EntityKind::Body, body))
        };
        let mut directed = DirectedArenaTree::with_capacity(self.tree.len());

        for node in self.tree.iter() {
            let TreeNode { body, joint } = node.load();
            let parent = node.parent().map(|parent| self.node(parent)).transpose()?;
            let (joint, parent) = match (joint, parent) {
                (Some(joint), Some(parent)) => (joint, parent.load().body.id()),
                _ => {
                    directed.set_root(node.load().clone(), body.id());
                    merged_into.insert(body.id(), body.id());
                    continue;
                }
            };
            let target = lookup(&merged_into, parent)?;
            if !joint.joint_type().is_fixed() {
                directed.add(
                    TreeNode {
                        body: body.clone(),
                        joint: Some(joint.clone()),
                    },
                    body.id(),
                    &target,
                )?;
                merged_into.insert(body.id(), body.id());
                continue;
            }

            debug!("Merging {body} into its predecessor ({joint})");
            let target_body = &mut directed
                .node_by_id_mut(&target)
                .ok_or_else(|| DynamicsError::unknown(EntityKind::Body, target))?
                .load_mut()
                .body;
            let before_to_target = *target_body.frame_definition(joint.frame_before())?;
            let after_to_before = joint.joint_transform(&[])?;
            let body_to_after = body.frame_definition(joint.frame_after())?.inverse();
            let body_to_target = before_to_target.compose(&after_to_before)?.compose(&body_to_after)?;
            target_body.merge(body, &body_to_target)?;
            merged_into.insert(body.id(), target);
        }

        let loops = self
            .loops
            .iter()
            .map(|lj| {
                Ok(LoopJoint {
                    joint: lj.joint.clone(),
                    predecessor: lookup(&merged_into, lj.predecessor)?,
                    successor: lookup(&merged_into, lj.successor)?,
                })
            })
            .collect::<Result<_>>()?;
        let mut mechanism = Mechanism {
            tree: directed.into(),
            loops,
            ..Mechanism::new(self.root_body().clone())
        };
        mechanism.gravity = self.gravity;
        mechanism.rebuild()?;
        Ok(mechanism)
    }

    /// A mechanism with the same bodies in which every non-root body is attached directly to the
    /// root by a [JointType::QuaternionFloating] joint between the root frame and the body's
    /// default frame. All joints of `self` become non-tree joints.
    pub fn to_maximal_coordinates(&self) -> Result<Mechanism<T>> {
        let root = self.root_body();
        let root_frame = root.default_frame();
        let mut directed = DirectedArenaTree::with_capacity(self.tree.len());
        directed.set_root(
            TreeNode {
                body: root.clone(),
                joint: None,
            },
            root.id(),
        );

        let mut loops = Vec::with_capacity(self.tree.len() + self.loops.len());
        for node in self.tree.iter().skip(1) {
            let TreeNode { body, joint } = node.load();
            let floating = Joint::between(
                format!("{}_floating", body.name()),
                JointType::QuaternionFloating,
                root_frame,
                body.default_frame(),
            );
            directed.add(
                TreeNode {
                    body: body.clone(),
                    joint: Some(floating),
                },
                body.id(),
                &root.id(),
            )?;
            if let (Some(joint), Some(parent)) = (joint, node.parent()) {
                loops.push(LoopJoint {
                    joint: joint.clone(),
                    predecessor: self.node(parent)?.load().body.id(),
                    successor: body.id(),
                });
            }
        }
        loops.extend(self.loops.iter().cloned());
        debug!(
            "Converted {} bodies to maximal coordinates ({} loop joints)",
            self.tree.len() - 1,
            loops.len()
        );

        let mut mechanism = Mechanism {
            tree: directed.into(),
            loops,
            ..Mechanism::new(root.clone())
        };
        mechanism.gravity = self.gravity;
        mechanism.rebuild()?;
        Ok(mechanism)
    }

    /// The sub-tree rooted at `body`, which becomes the (fixed) root of the new mechanism. Loop
    /// joints are kept if both of their bodies are part of the sub-tree. Gravity keeps its
    /// components and is expressed in the new root frame.
    pub fn submechanism(&self, body: BodyId) -> Result<Mechanism<T>> {
        let root_index = self.index_of(body)?;
        let mut nodes = self.tree.iter_sub(root_index);
        let root = nodes
            .next()
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Body, body))?;
        let mut directed: DirectedArenaTree<TreeNode<T>, BodyId> = DirectedArenaTree::new();
        directed.set_root(
            TreeNode {
                body: root.load().body.clone(),
                joint: None,
            },
            body,
        );
        let mut members = HashSet::from([body]);
        for node in nodes {
            let parent = node
                .parent()
                .ok_or_else(|| DynamicsError::TopologyViolation(format!("{} has no parent", node.load().body)))?;
            let parent_id = self.node(parent)?.load().body.id();
            directed.add(node.load().clone(), node.load().body.id(), &parent_id)?;
            members.insert(node.load().body.id());
        }
        let loops = self
            .loops
            .iter()
            .filter(|lj| members.contains(&lj.predecessor) && members.contains(&lj.successor))
            .cloned()
            .collect();

        debug!("Extracted sub-mechanism of {} bodies rooted at {}", members.len(), root.load().body);
        let tree: DepthFirstArenaTree<_, _> = directed.into();
        let mut mechanism = Mechanism {
            tree,
            loops,
            ..Mechanism::new(root.load().body.clone())
        };
        mechanism.gravity = self.gravity;
        mechanism.rebuild()?;
        Ok(mechanism)
    }
}
