//! Ready-made mechanisms for tests, benchmarks and tutorials.
//!
//! Links are modelled as thin rods hanging along `-z` from their joint, with the default frame of
//! each link at its joint.

use crate::{
    body::RigidBody,
    errors::Result,
    joint::{Joint, JointType},
    mechanism::Mechanism,
    scalar::lit,
    spatial::{CoordinateFrame, SpatialInertia, Transform3D},
    Scalar,
};
use nalgebra::{Matrix3, Vector3};

/// A rod of the given mass and length hanging along `-z` from its frame origin, with moment
/// `m l² / 12` about the transverse axes through its center of mass
pub fn rod<T: Scalar>(name: &str, mass: T, length: T) -> RigidBody<T> {
    let transverse = mass * length * length / lit::<T>(12.0);
    let axial = mass * lit::<T>(1e-4);
    let inertia = SpatialInertia::from_com(
        CoordinateFrame::new(),
        mass,
        Vector3::new(T::zero(), T::zero(), -length / lit::<T>(2.0)),
        Matrix3::from_diagonal(&Vector3::new(transverse, transverse, axial)),
    );
    RigidBody::new(name, inertia)
}

/// A solid box centered at its frame origin
pub fn cuboid<T: Scalar>(name: &str, mass: T, size: Vector3<T>) -> RigidBody<T> {
    let factor = mass / lit::<T>(12.0);
    let squared = size.component_mul(&size);
    let moment = Vector3::new(
        squared.y + squared.z,
        squared.x + squared.z,
        squared.x + squared.y,
    ) * factor;
    let inertia = SpatialInertia::from_com(
        CoordinateFrame::new(),
        mass,
        Vector3::zeros(),
        Matrix3::from_diagonal(&moment),
    );
    RigidBody::new(name, inertia)
}

/// Attaches `child` to `parent` with the joint located at `offset` in the parent's default frame
fn attach_at<T: Scalar>(
    mechanism: &mut Mechanism<T>,
    parent: &str,
    joint: Joint<T>,
    child: RigidBody<T>,
    offset: Vector3<T>,
) -> Result<()> {
    let parent = mechanism.find_body(parent)?;
    let (parent_id, parent_frame) = (parent.id(), parent.default_frame());
    let joint_pose = Transform3D::from_translation(joint.frame_before(), parent_frame, offset);
    let successor_pose = Transform3D::identity_between(child.default_frame(), joint.frame_after());
    mechanism.attach(parent_id, joint, child, joint_pose, successor_pose)
}

fn down<T: Scalar>(length: T) -> Vector3<T> {
    Vector3::new(T::zero(), T::zero(), -length)
}

/// Planar double pendulum swinging about `y` with unit masses and lengths. Bodies `upper` and
/// `lower`, joints `shoulder` and `elbow`.
pub fn double_pendulum<T: Scalar>() -> Result<Mechanism<T>> {
    double_pendulum_with(T::one(), T::one(), T::one(), T::one())
}

pub fn double_pendulum_with<T: Scalar>(upper_mass: T, upper_length: T, lower_mass: T, lower_length: T) -> Result<Mechanism<T>> {
    let mut mechanism = Mechanism::new(RigidBody::massless("world"));
    let axis = Vector3::y();
    attach_at(
        &mut mechanism,
        "world",
        Joint::new("shoulder", JointType::revolute(axis)),
        rod("upper", upper_mass, upper_length),
        Vector3::zeros(),
    )?;
    attach_at(
        &mut mechanism,
        "upper",
        Joint::new("elbow", JointType::revolute(axis)),
        rod("lower", lower_mass, lower_length),
        down(upper_length),
    )?;
    Ok(mechanism)
}

/// Serial arm mixing revolute, prismatic and fixed joints:
///
/// `world -(fixed)- pedestal -(revolute z)- base -(fixed)- sensor -(revolute x)- arm
/// -(prismatic y)- slider -(fixed)- tool`, with a second branch `base -(revolute y)- side`
pub fn arm_with_fixed_joints<T: Scalar>() -> Result<Mechanism<T>> {
    let mut mechanism = Mechanism::new(RigidBody::massless("world"));
    let half = lit::<T>(0.5);
    attach_at(
        &mut mechanism,
        "world",
        Joint::new("mount", JointType::Fixed),
        cuboid("pedestal", lit::<T>(3.0), Vector3::new(lit::<T>(0.4), lit::<T>(0.4), lit::<T>(0.2))),
        Vector3::new(lit::<T>(0.1), T::zero(), lit::<T>(0.1)),
    )?;
    attach_at(
        &mut mechanism,
        "pedestal",
        Joint::new("yaw", JointType::revolute(Vector3::z())),
        rod("base", lit::<T>(2.0), half),
        Vector3::new(T::zero(), T::zero(), lit::<T>(0.1)),
    )?;
    attach_at(
        &mut mechanism,
        "base",
        Joint::new("sensor_mount", JointType::Fixed),
        cuboid("sensor", lit::<T>(0.3), Vector3::new(lit::<T>(0.05), lit::<T>(0.05), lit::<T>(0.05))),
        Vector3::new(lit::<T>(0.05), T::zero(), -half),
    )?;
    attach_at(
        &mut mechanism,
        "sensor",
        Joint::new("pitch", JointType::revolute(Vector3::x())),
        rod("arm", lit::<T>(1.5), lit::<T>(0.8)),
        Vector3::new(T::zero(), lit::<T>(0.02), T::zero()),
    )?;
    attach_at(
        &mut mechanism,
        "arm",
        Joint::new("extend", JointType::prismatic(Vector3::y())),
        rod("slider", lit::<T>(0.7), lit::<T>(0.4)),
        down(lit::<T>(0.8)),
    )?;
    attach_at(
        &mut mechanism,
        "slider",
        Joint::new("tool_mount", JointType::Fixed),
        cuboid("tool", lit::<T>(0.2), Vector3::new(lit::<T>(0.1), lit::<T>(0.02), lit::<T>(0.02))),
        down(lit::<T>(0.4)),
    )?;
    attach_at(
        &mut mechanism,
        "base",
        Joint::new("side_pitch", JointType::revolute(Vector3::y())),
        rod("side", lit::<T>(0.9), lit::<T>(0.6)),
        Vector3::new(-lit::<T>(0.05), T::zero(), -lit::<T>(0.2)),
    )?;
    Ok(mechanism)
}

/// A floating torso with a chain of `links` rods attached by revolute joints cycling through the
/// `x`, `y` and `z` axes, a ball-jointed `hand` at the tip and a planar `foot` below the torso
pub fn floating_chain<T: Scalar>(links: usize) -> Result<Mechanism<T>> {
    let mut mechanism = Mechanism::new(RigidBody::massless("world"));
    let length = lit::<T>(0.3);
    attach_at(
        &mut mechanism,
        "world",
        Joint::new("floating", JointType::QuaternionFloating),
        cuboid("torso", lit::<T>(10.0), Vector3::new(lit::<T>(0.3), lit::<T>(0.2), lit::<T>(0.5))),
        Vector3::zeros(),
    )?;
    let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
    let mut parent = "torso".to_string();
    for index in 0..links {
        let name = format!("link{index}");
        let offset = if index == 0 { down(lit::<T>(0.25)) } else { down(length) };
        attach_at(
            &mut mechanism,
            &parent,
            Joint::new(format!("joint{index}"), JointType::revolute(axes[index % 3])),
            rod(&name, lit::<T>(1.0), length),
            offset,
        )?;
        parent = name;
    }
    attach_at(
        &mut mechanism,
        &parent,
        Joint::new("wrist", JointType::Spherical),
        cuboid("hand", lit::<T>(0.5), Vector3::new(lit::<T>(0.1), lit::<T>(0.05), lit::<T>(0.15))),
        down(length),
    )?;
    attach_at(
        &mut mechanism,
        "torso",
        Joint::new("ankle", JointType::planar(Vector3::x(), Vector3::y())),
        cuboid("foot", lit::<T>(1.2), Vector3::new(lit::<T>(0.25), lit::<T>(0.1), lit::<T>(0.05))),
        Vector3::new(lit::<T>(0.1), T::zero(), -lit::<T>(0.25)),
    )?;
    Ok(mechanism)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn model_dimensions() {
        let pendulum = double_pendulum::<f64>().unwrap();
        assert_eq!((pendulum.num_positions(), pendulum.num_velocities()), (2, 2));

        let arm = arm_with_fixed_joints::<f64>().unwrap();
        assert_eq!(arm.num_bodies(), 8);
        assert_eq!(arm.num_velocities(), 4);
        assert_abs_diff_eq!(arm.total_mass(), 8.6, epsilon = 1e-12);

        let chain = floating_chain::<f64>(4).unwrap();
        assert_eq!(chain.num_positions(), 7 + 4 + 4 + 3);
        assert_eq!(chain.num_velocities(), 6 + 4 + 3 + 3);
    }

    #[test]
    fn cuboid_inertia() {
        let body = cuboid::<f64>("box", 12.0, Vector3::new(1.0, 2.0, 3.0));
        let inertia = body.inertia().unwrap();
        assert_abs_diff_eq!(inertia.moment().diagonal(), Vector3::new(13.0, 10.0, 5.0), epsilon = 1e-12);
    }
}
