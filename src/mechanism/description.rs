//! Assembly of a [Mechanism] from format-neutral link descriptions, as yielded by a robot
//! description parser. The link frame coincides with `frame_after` of the link's joint.

use super::Mechanism;
use crate::{
    body::RigidBody,
    errors::{DynamicsError, EntityKind, Result},
    joint::{Joint, JointType},
    spatial::{CoordinateFrame, SpatialInertia, Transform3D},
    Scalar,
};
use itertools::Itertools;
use nalgebra::{Isometry3, Matrix3, Vector3};
use std::collections::HashSet;
use tracing::debug;

/// Mass properties of a link, expressed in the link frame
#[derive(Debug, Clone, PartialEq)]
pub struct InertialDescription<T: Scalar> {
    pub mass: T,
    pub center_of_mass: Vector3<T>,
    pub moment_about_com: Matrix3<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkDescription<T: Scalar> {
    pub name: String,
    /// Name of the parent link
    pub parent: String,
    pub joint_name: String,
    pub joint_type: JointType<T>,
    /// Pose of the joint frame in the parent's link frame
    pub origin: Isometry3<T>,
    pub inertial: Option<InertialDescription<T>>,
}

impl<T: Scalar> LinkDescription<T> {
    fn into_body(self) -> (RigidBody<T>, Joint<T>, Isometry3<T>, String) {
        let frame = CoordinateFrame::new();
        let inertia = match &self.inertial {
            Some(inertial) => SpatialInertia::from_com(
                frame,
                inertial.mass,
                inertial.center_of_mass,
                inertial.moment_about_com,
            ),
            None => SpatialInertia::zero(frame),
        };
        let body = RigidBody::new(self.name, inertia);
        let joint = Joint::new(self.joint_name, self.joint_type);
        (body, joint, self.origin, self.parent)
    }
}

impl<T: Scalar> Mechanism<T> {
    /// Builds a mechanism rooted at a massless body named `root_name`. Links may be given in any
    /// order; a link whose parent never appears yields [DynamicsError::UnknownEntity].
    pub fn from_descriptions(root_name: &str, links: Vec<LinkDescription<T>>) -> Result<Mechanism<T>> {
        let mut names = HashSet::from([root_name.to_string()]);
        for link in links.iter() {
            if !names.insert(link.name.clone()) {
                return Err(DynamicsError::TopologyViolation(format!(
                    "link {} is defined more than once",
                    link.name
                )));
            }
        }

        let mut mechanism = Mechanism::new(RigidBody::massless(root_name));
        let mut pending = links;
        while !pending.is_empty() {
            let (ready, waiting): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|link| mechanism.find_body(&link.parent).is_ok());
            if ready.is_empty() {
                return Err(unresolved(&waiting));
            }
            for link in ready {
                let (body, joint, origin, parent) = link.into_body();
                let parent = mechanism.find_body(&parent)?;
                let (parent_id, parent_frame) = (parent.id(), parent.default_frame());
                let joint_pose = Transform3D::from_quaternion(
                    joint.frame_before(),
                    parent_frame,
                    &origin.rotation,
                    origin.translation.vector,
                );
                let successor_pose = Transform3D::identity_between(body.default_frame(), joint.frame_after());
                mechanism.attach(parent_id, joint, body, joint_pose, successor_pose)?;
            }
            pending = waiting;
        }
        debug!("Assembled mechanism with {} bodies", mechanism.num_bodies());
        Ok(mechanism)
    }
}

/// Links that can never be attached: either a parent is not described at all, or the remaining
/// links are their own ancestors
fn unresolved<T: Scalar>(waiting: &[LinkDescription<T>]) -> DynamicsError {
    let pending = waiting.iter().map(|link| link.name.as_str()).collect::<HashSet<_>>();
    match waiting.iter().find(|link| !pending.contains(link.parent.as_str())) {
        Some(orphan) => DynamicsError::unknown(EntityKind::Body, &orphan.parent),
        None => DynamicsError::TopologyViolation(format!(
            "links {} form a cycle",
            waiting.iter().map(|link| link.name.as_str()).sorted().join(", ")
        )),
    }
}
