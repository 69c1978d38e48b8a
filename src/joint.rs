//! Joints connect a frame on the predecessor body (`frame_before`) to a frame on the successor
//! body (`frame_after`). The joint type determines how the configuration `q` and velocity `v`
//! of the joint map to the relative pose and motion of the two frames.
//!
//! Velocities of all joint types are expressed in `frame_after`, so motion subspaces are constant.
//! Orientations are stored as quaternions `[w, x, y, z]`.

use crate::{
    errors::{DynamicsError, Result},
    scalar::lit,
    spatial::{
        util::orthonormal_complement, CoordinateFrame, GeometricJacobian, SpatialAcceleration,
        Transform3D, Twist, WrenchMatrix,
    },
    Scalar,
};
use nalgebra::{Quaternion, Rotation3, Unit, UnitQuaternion, Vector3};
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_JOINT_ID: AtomicU64 = AtomicU64::new(0);

/// Globally unique identifier of a [Joint]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(u64);

impl JointId {
    fn next() -> Self {
        JointId(NEXT_JOINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JointType<T: Scalar> {
    /// No relative motion
    Fixed,
    /// Rotation about a unit axis
    Revolute { axis: Vector3<T> },
    /// Translation along a unit axis
    Prismatic { axis: Vector3<T> },
    /// Translation in the plane spanned by two orthonormal axes and rotation about their normal.
    /// `q = [x, y, angle]`, `v = [vx, vy, angular rate]` in `frame_after`.
    Planar { x_axis: Vector3<T>, y_axis: Vector3<T> },
    /// Rotation about a point, `q = quaternion`, `v = angular velocity`
    Spherical,
    /// Free motion, `q = [quaternion, position]`, `v = [angular, linear]`
    QuaternionFloating,
}

impl<T: Scalar> JointType<T> {
    pub fn revolute(axis: Vector3<T>) -> Self {
        JointType::Revolute { axis: axis.normalize() }
    }

    pub fn prismatic(axis: Vector3<T>) -> Self {
        JointType::Prismatic { axis: axis.normalize() }
    }

    /// The y axis is orthogonalized against the x axis
    pub fn planar(x_axis: Vector3<T>, y_axis: Vector3<T>) -> Self {
        let x_axis = x_axis.normalize();
        let y_axis = (y_axis - x_axis * x_axis.dot(&y_axis)).normalize();
        JointType::Planar { x_axis, y_axis }
    }

    pub fn num_positions(&self) -> usize {
        match self {
            JointType::Fixed => 0,
            JointType::Revolute { .. } | JointType::Prismatic { .. } => 1,
            JointType::Planar { .. } => 3,
            JointType::Spherical => 4,
            JointType::QuaternionFloating => 7,
        }
    }

    pub fn num_velocities(&self) -> usize {
        match self {
            JointType::Fixed => 0,
            JointType::Revolute { .. } | JointType::Prismatic { .. } => 1,
            JointType::Planar { .. } | JointType::Spherical => 3,
            JointType::QuaternionFloating => 6,
        }
    }

    /// Number of independent constraint wrenches: `6 - num_velocities`
    pub fn num_constraints(&self) -> usize {
        6 - self.num_velocities()
    }

    /// Fails with [DynamicsError::SingularSystem] if an axis was constructed from a zero (or, for
    /// the planar y axis, parallel) vector
    pub fn check_axes(&self) -> Result<()> {
        let axes = match self {
            JointType::Revolute { axis } | JointType::Prismatic { axis } => vec![axis],
            JointType::Planar { x_axis, y_axis } => vec![x_axis, y_axis],
            _ => vec![],
        };
        // Normalizing a zero vector yields NaN entries
        if axes.iter().all(|axis| axis.norm() > lit::<T>(0.5)) {
            Ok(())
        } else {
            Err(DynamicsError::SingularSystem(format!("{self} joint has a degenerate axis")))
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, JointType::Fixed)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, JointType::QuaternionFloating)
    }
}

impl<T: Scalar> fmt::Display for JointType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JointType::Fixed => write!(f, "fixed"),
            JointType::Revolute { axis } => write!(f, "revolute ({}, {}, {})", axis.x, axis.y, axis.z),
            JointType::Prismatic { axis } => write!(f, "prismatic ({}, {}, {})", axis.x, axis.y, axis.z),
            JointType::Planar { .. } => write!(f, "planar"),
            JointType::Spherical => write!(f, "spherical"),
            JointType::QuaternionFloating => write!(f, "quaternion floating"),
        }
    }
}

fn quaternion<T: Scalar>(q: &[T]) -> Result<UnitQuaternion<T>> {
    UnitQuaternion::try_new(Quaternion::new(q[0], q[1], q[2], q[3]), lit::<T>(1e-12)).ok_or_else(|| {
        DynamicsError::SingularSystem("orientation quaternion of the configuration is zero".to_string())
    })
}

fn normalize_quaternion<T: Scalar>(q: &mut [T]) {
    let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if norm > T::zero() {
        q[..4].iter_mut().for_each(|value| *value /= norm);
    } else {
        set_identity_quaternion(q);
    }
}

fn set_identity_quaternion<T: Scalar>(q: &mut [T]) {
    q[..4].copy_from_slice(&[T::one(), T::zero(), T::zero(), T::zero()]);
}

/// `q̇ = ½ q ⊗ (0, ω)` for a body-frame angular velocity `ω`
fn quaternion_derivative<T: Scalar>(q: &[T], angular: &Vector3<T>, qdot: &mut [T]) {
    let half = lit::<T>(0.5);
    let (w, u) = (q[0], Vector3::new(q[1], q[2], q[3]));
    let vector = (angular * w + u.cross(angular)) * half;
    qdot[0] = -u.dot(angular) * half;
    qdot[1..4].copy_from_slice(vector.as_slice());
}

#[derive(Debug, Clone)]
pub struct Joint<T: Scalar> {
    id: JointId,
    name: String,
    joint_type: JointType<T>,
    frame_before: CoordinateFrame,
    frame_after: CoordinateFrame,
}

impl<T: Scalar> Joint<T> {
    /// A joint with fresh `frame_before` and `frame_after`
    pub fn new(name: impl Into<String>, joint_type: JointType<T>) -> Self {
        Joint {
            id: JointId::next(),
            name: name.into(),
            joint_type,
            frame_before: CoordinateFrame::new(),
            frame_after: CoordinateFrame::new(),
        }
    }

    /// A joint between two existing frames
    pub fn between(
        name: impl Into<String>,
        joint_type: JointType<T>,
        frame_before: CoordinateFrame,
        frame_after: CoordinateFrame,
    ) -> Self {
        Joint {
            id: JointId::next(),
            name: name.into(),
            joint_type,
            frame_before,
            frame_after,
        }
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joint_type(&self) -> &JointType<T> {
        &self.joint_type
    }

    pub fn frame_before(&self) -> CoordinateFrame {
        self.frame_before
    }

    pub fn frame_after(&self) -> CoordinateFrame {
        self.frame_after
    }

    pub fn num_positions(&self) -> usize {
        self.joint_type.num_positions()
    }

    pub fn num_velocities(&self) -> usize {
        self.joint_type.num_velocities()
    }

    fn check_q(&self, q: &[T]) -> Result<()> {
        DynamicsError::check_dimension(self.num_positions(), q.len())
    }

    fn check_v(&self, v: &[T]) -> Result<()> {
        DynamicsError::check_dimension(self.num_velocities(), v.len())
    }

    /// Pose of `frame_after` relative to `frame_before` (maps `frame_after` to `frame_before`)
    pub fn joint_transform(&self, q: &[T]) -> Result<Transform3D<T>> {
        self.check_q(q)?;
        let (from, to) = (self.frame_after, self.frame_before);
        Ok(match &self.joint_type {
            JointType::Fixed => Transform3D::identity_between(from, to),
            JointType::Revolute { axis } => Transform3D::from_rotation(
                from,
                to,
                &Rotation3::from_axis_angle(&Unit::new_unchecked(*axis), q[0]),
            ),
            JointType::Prismatic { axis } => Transform3D::from_translation(from, to, axis * q[0]),
            JointType::Planar { x_axis, y_axis } => {
                let normal = Unit::new_unchecked(x_axis.cross(y_axis));
                Transform3D::new(
                    from,
                    to,
                    Rotation3::from_axis_angle(&normal, q[2]).into_inner(),
                    x_axis * q[0] + y_axis * q[1],
                )
            }
            JointType::Spherical => Transform3D::from_quaternion(from, to, &quaternion(q)?, Vector3::zeros()),
            JointType::QuaternionFloating => Transform3D::from_quaternion(
                from,
                to,
                &quaternion(&q[..4])?,
                Vector3::new(q[4], q[5], q[6]),
            ),
        })
    }

    /// Unit twists of `frame_after` with respect to `frame_before`, expressed in `frame_after`
    pub fn motion_subspace(&self) -> GeometricJacobian<T> {
        let mut subspace = GeometricJacobian::zeros(
            self.frame_after,
            self.frame_before,
            self.frame_after,
            self.num_velocities(),
        );
        for index in 0..self.num_velocities() {
            let (angular, linear) = self.motion_subspace_column(index);
            subspace.set_column(index, &angular, &linear);
        }
        subspace
    }

    /// Column `index` of the motion subspace as `(angular, linear)`
    pub(crate) fn motion_subspace_column(&self, index: usize) -> (Vector3<T>, Vector3<T>) {
        let zero = Vector3::zeros();
        match &self.joint_type {
            JointType::Fixed => (zero, zero),
            JointType::Revolute { axis } => (*axis, zero),
            JointType::Prismatic { axis } => (zero, *axis),
            JointType::Planar { x_axis, y_axis } => match index {
                0 => (zero, *x_axis),
                1 => (zero, *y_axis),
                _ => (x_axis.cross(y_axis), zero),
            },
            JointType::Spherical => (Vector3::ith(index, T::one()), zero),
            JointType::QuaternionFloating if index < 3 => (Vector3::ith(index, T::one()), zero),
            JointType::QuaternionFloating => (zero, Vector3::ith(index - 3, T::one())),
        }
    }

    /// Wrenches the joint can transmit without doing work, expressed in `frame_after`.
    /// Together with the motion subspace they span all wrenches.
    pub fn constraint_wrench_subspace(&self) -> WrenchMatrix<T> {
        let zero = Vector3::zeros();
        let unit = |i| Vector3::ith(i, T::one());
        let columns: Vec<(Vector3<T>, Vector3<T>)> = match &self.joint_type {
            JointType::Fixed => (0..3)
                .map(|i| (unit(i), zero))
                .chain((0..3).map(|i| (zero, unit(i))))
                .collect(),
            JointType::Revolute { axis } => {
                let (b, c) = orthonormal_complement(axis);
                let mut columns = vec![(b, zero), (c, zero)];
                columns.extend((0..3).map(|i| (zero, unit(i))));
                columns
            }
            JointType::Prismatic { axis } => {
                let (b, c) = orthonormal_complement(axis);
                let mut columns: Vec<_> = (0..3).map(|i| (unit(i), zero)).collect();
                columns.extend([(zero, b), (zero, c)]);
                columns
            }
            JointType::Planar { x_axis, y_axis } => {
                vec![(*x_axis, zero), (*y_axis, zero), (zero, x_axis.cross(y_axis))]
            }
            JointType::Spherical => (0..3).map(|i| (zero, unit(i))).collect(),
            JointType::QuaternionFloating => vec![],
        };
        WrenchMatrix::from_columns(self.frame_after, &columns)
    }

    /// Twist of `frame_after` with respect to `frame_before`, expressed in `frame_after`
    pub fn joint_twist(&self, q: &[T], v: &[T]) -> Result<Twist<T>> {
        self.check_q(q)?;
        self.check_v(v)?;
        let (mut angular, mut linear) = (Vector3::zeros(), Vector3::zeros());
        for (index, &velocity) in v.iter().enumerate() {
            let (w, l) = self.motion_subspace_column(index);
            angular += w * velocity;
            linear += l * velocity;
        }
        Ok(Twist::new(
            self.frame_after,
            self.frame_before,
            self.frame_after,
            angular,
            linear,
        ))
    }

    /// Velocity-product acceleration of the joint. Zero for all supported types because their
    /// motion subspaces are constant in `frame_after`.
    pub fn bias_acceleration(&self, q: &[T], v: &[T]) -> Result<SpatialAcceleration<T>> {
        self.check_q(q)?;
        self.check_v(v)?;
        Ok(SpatialAcceleration::zero(
            self.frame_after,
            self.frame_before,
            self.frame_after,
        ))
    }

    /// Writes the configuration in which `frame_after` coincides with `frame_before`
    pub fn zero_configuration(&self, q: &mut [T]) -> Result<()> {
        self.check_q(q)?;
        q.iter_mut().for_each(|value| *value = T::zero());
        if matches!(
            self.joint_type,
            JointType::Spherical | JointType::QuaternionFloating
        ) {
            set_identity_quaternion(q);
        }
        Ok(())
    }

    /// Projects the configuration back onto the joint's configuration manifold (unit quaternions)
    pub fn normalize_configuration(&self, q: &mut [T]) -> Result<()> {
        self.check_q(q)?;
        if matches!(
            self.joint_type,
            JointType::Spherical | JointType::QuaternionFloating
        ) {
            normalize_quaternion(q);
        }
        Ok(())
    }

    /// Maps the joint velocity to the time derivative of the configuration
    pub fn configuration_derivative(&self, q: &[T], v: &[T], qdot: &mut [T]) -> Result<()> {
        self.check_q(q)?;
        self.check_v(v)?;
        self.check_q(qdot)?;
        match &self.joint_type {
            JointType::Fixed => {}
            JointType::Revolute { .. } | JointType::Prismatic { .. } => qdot[0] = v[0],
            JointType::Planar { x_axis, y_axis } => {
                let normal = Unit::new_unchecked(x_axis.cross(y_axis));
                let rotation = Rotation3::from_axis_angle(&normal, q[2]);
                let velocity = rotation * (x_axis * v[0] + y_axis * v[1]);
                qdot[0] = x_axis.dot(&velocity);
                qdot[1] = y_axis.dot(&velocity);
                qdot[2] = v[2];
            }
            JointType::Spherical => {
                quaternion_derivative(q, &Vector3::new(v[0], v[1], v[2]), qdot);
            }
            JointType::QuaternionFloating => {
                let angular = Vector3::new(v[0], v[1], v[2]);
                quaternion_derivative(&q[..4], &angular, &mut qdot[..4]);
                let velocity = quaternion(&q[..4])? * Vector3::new(v[3], v[4], v[5]);
                qdot[4..].copy_from_slice(velocity.as_slice());
            }
        }
        Ok(())
    }
}

impl<T: Scalar> fmt::Display for Joint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.joint_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn all_types() -> Vec<JointType<f64>> {
        vec![
            JointType::Fixed,
            JointType::revolute(Vector3::new(1.0, 1.0, 0.0)),
            JointType::prismatic(Vector3::z()),
            JointType::planar(Vector3::x(), Vector3::y()),
            JointType::Spherical,
            JointType::QuaternionFloating,
        ]
    }

    #[test]
    fn revolute_transform() {
        let joint = Joint::new("hinge", JointType::revolute(Vector3::z()));
        let transform = joint.joint_transform(&[FRAC_PI_2]).unwrap();
        assert_eq!(transform.from(), joint.frame_after());
        assert_eq!(transform.to(), joint.frame_before());
        assert_abs_diff_eq!(transform.rotation() * Vector3::x(), Vector3::y(), epsilon = 1e-12);
        assert!(matches!(
            joint.joint_transform(&[]),
            Err(DynamicsError::DimensionMismatch { expected: 1, actual: 0 })
        ));
    }

    #[test]
    fn subspaces_are_complementary() {
        for joint_type in all_types() {
            let joint = Joint::new("joint", joint_type);
            let motion = joint.motion_subspace();
            let constraints = joint.constraint_wrench_subspace();
            assert_eq!(motion.ncols() + constraints.ncols(), 6);
            for i in 0..constraints.ncols() {
                for j in 0..motion.ncols() {
                    assert_abs_diff_eq!(constraints.power(i, &motion, j).unwrap(), 0.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn zero_configuration_is_identity() {
        for joint_type in all_types() {
            let joint = Joint::new("joint", joint_type);
            let mut q = vec![0.3; joint.num_positions()];
            joint.zero_configuration(&mut q).unwrap();
            let transform = joint.joint_transform(&q).unwrap();
            assert!(transform.is_approx(
                &Transform3D::identity_between(joint.frame_after(), joint.frame_before()),
                1e-12
            ));
        }
    }

    #[test]
    fn degenerate_axes_and_orientations() {
        assert!(JointType::revolute(Vector3::x() * 3.0).check_axes().is_ok());
        assert!(JointType::<f64>::Spherical.check_axes().is_ok());
        for joint_type in [
            JointType::revolute(Vector3::zeros()),
            JointType::prismatic(Vector3::zeros()),
            JointType::planar(Vector3::x(), Vector3::x() * 2.0),
        ] {
            assert!(matches!(joint_type.check_axes(), Err(DynamicsError::SingularSystem(_))));
        }

        let joint = Joint::new("free", JointType::<f64>::QuaternionFloating);
        let q = [0.0; 7];
        assert!(matches!(joint.joint_transform(&q), Err(DynamicsError::SingularSystem(_))));
        let mut qdot = [0.0; 7];
        assert!(joint.configuration_derivative(&q, &[1.0; 6], &mut qdot).is_err());
    }

    #[test]
    fn quaternion_normalization() {
        let joint = Joint::new("ball", JointType::Spherical);
        let mut q = [2.0, 0.0, 0.0, 0.0];
        joint.normalize_configuration(&mut q).unwrap();
        assert_eq!(q, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn configuration_derivative_matches_finite_difference() {
        let dt = 1e-7;
        for joint_type in all_types() {
            let joint = Joint::new("joint", joint_type);
            let mut q = (0..joint.num_positions()).map(|i| 0.1 + 0.2 * i as f64).collect::<Vec<_>>();
            joint.normalize_configuration(&mut q).unwrap();
            let v = (0..joint.num_velocities()).map(|i| 0.5 - 0.3 * i as f64).collect::<Vec<_>>();
            let mut qdot = vec![0.0; q.len()];
            joint.configuration_derivative(&q, &v, &mut qdot).unwrap();
            let q_next = q.iter().zip(qdot.iter()).map(|(q, d)| q + d * dt).collect::<Vec<_>>();

            // The twist in frame_after is the relative motion of the two poses
            let before = joint.joint_transform(&q).unwrap();
            let after = joint.joint_transform(&q_next).unwrap();
            let twist = joint.joint_twist(&q, &v).unwrap();
            let rot_rate = (after.rotation() - before.rotation()) / dt;
            let omega_hat = before.rotation().transpose() * rot_rate;
            assert_abs_diff_eq!(omega_hat[(2, 1)], twist.angular().x, epsilon = 1e-5);
            assert_abs_diff_eq!(omega_hat[(0, 2)], twist.angular().y, epsilon = 1e-5);
            assert_abs_diff_eq!(omega_hat[(1, 0)], twist.angular().z, epsilon = 1e-5);
            let velocity = before.rotation().transpose() * (after.translation() - before.translation()) / dt;
            assert_abs_diff_eq!(velocity, *twist.linear(), epsilon = 1e-5);
        }
    }
}
