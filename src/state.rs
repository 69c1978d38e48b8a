//! The state of a mechanism: joint configuration `q`, joint velocity `v` and a cache of
//! quantities derived from them.
//!
//! Cached quantities are grouped into classes. Writing `q` marks every class stale, writing `v`
//! only the velocity dependent classes. Reading a stale class recomputes it in a single sweep
//! over the tree, after which it stays fresh until the next write. All per-body buffers are
//! allocated once when the state is created.

use crate::{
    arena::Nodelike,
    body::BodyId,
    errors::{DynamicsError, Result},
    joint::JointId,
    mechanism::{parent_index, Mechanism},
    spatial::{
        CoordinateFrame, GeometricJacobian, SpatialAcceleration, SpatialInertia, Transform3D, Twist,
    },
    Scalar,
};
use nalgebra::{DMatrix, DVector, Rotation3, UnitQuaternion};
use tracing::trace;

/// Classes of cached quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedQuantity {
    /// Body default frames to the root frame (depend on `q`)
    Transforms,
    /// Joint motion subspaces in the root frame (depend on `q`)
    MotionSubspaces,
    /// Body twists with respect to the root (depend on `q` and `v`)
    Twists,
    /// Velocity-product accelerations with respect to the root (depend on `q` and `v`)
    BiasAccelerations,
    /// Body inertias in the root frame (depend on `q`)
    Inertias,
    /// Composite rigid-body inertias of every sub-tree in the root frame (depend on `q`)
    CompositeInertias,
}

impl CachedQuantity {
    fn depends_on_velocity(&self) -> bool {
        matches!(self, CachedQuantity::Twists | CachedQuantity::BiasAccelerations)
    }
}

#[derive(Debug, Clone)]
struct CacheElement<D> {
    data: Vec<D>,
    fresh: bool,
}

impl<D> CacheElement<D> {
    fn new(data: Vec<D>) -> Self {
        CacheElement { data, fresh: false }
    }
}

/// All per-body data is indexed by the body's position in the mechanism's depth-first order.
#[derive(Debug, Clone)]
pub struct MechanismState<'a, T: Scalar> {
    mechanism: &'a Mechanism<T>,
    q: DVector<T>,
    v: DVector<T>,
    transforms: CacheElement<Transform3D<T>>,
    motion_subspaces: CacheElement<GeometricJacobian<T>>,
    twists: CacheElement<Twist<T>>,
    bias_accelerations: CacheElement<SpatialAcceleration<T>>,
    inertias: CacheElement<SpatialInertia<T>>,
    crb_inertias: CacheElement<SpatialInertia<T>>,
}

impl<'a, T: Scalar> MechanismState<'a, T> {
    /// A state in the zero configuration with zero velocity
    pub fn new(mechanism: &'a Mechanism<T>) -> Result<Self> {
        let root = mechanism.root_frame();
        let bodies = mechanism.num_bodies();
        let mut motion_subspaces = Vec::with_capacity(bodies);
        for node in mechanism.tree().iter() {
            let body = node.get().body().default_frame();
            let subspace = match (node.get().joint(), node.parent()) {
                (Some(joint), Some(parent)) => {
                    let base = mechanism.node(parent)?.get().body().default_frame();
                    GeometricJacobian::zeros(body, base, root, joint.num_velocities())
                }
                _ => GeometricJacobian::zeros(body, body, root, 0),
            };
            motion_subspaces.push(subspace);
        }

        let mut state = MechanismState {
            mechanism,
            q: DVector::zeros(mechanism.num_positions()),
            v: DVector::zeros(mechanism.num_velocities()),
            transforms: CacheElement::new(vec![Transform3D::identity(root); bodies]),
            motion_subspaces: CacheElement::new(motion_subspaces),
            twists: CacheElement::new(vec![Twist::zero(root, root, root); bodies]),
            bias_accelerations: CacheElement::new(vec![SpatialAcceleration::zero(root, root, root); bodies]),
            inertias: CacheElement::new(vec![SpatialInertia::zero(root); bodies]),
            crb_inertias: CacheElement::new(vec![SpatialInertia::zero(root); bodies]),
        };
        state.zero_configuration()?;
        Ok(state)
    }

    pub fn mechanism(&self) -> &'a Mechanism<T> {
        self.mechanism
    }

    pub fn num_positions(&self) -> usize {
        self.q.len()
    }

    pub fn num_velocities(&self) -> usize {
        self.v.len()
    }

    pub fn is_fresh(&self, quantity: CachedQuantity) -> bool {
        match quantity {
            CachedQuantity::Transforms => self.transforms.fresh,
            CachedQuantity::MotionSubspaces => self.motion_subspaces.fresh,
            CachedQuantity::Twists => self.twists.fresh,
            CachedQuantity::BiasAccelerations => self.bias_accelerations.fresh,
            CachedQuantity::Inertias => self.inertias.fresh,
            CachedQuantity::CompositeInertias => self.crb_inertias.fresh,
        }
    }

    fn invalidate_configuration(&mut self) {
        self.transforms.fresh = false;
        self.motion_subspaces.fresh = false;
        self.inertias.fresh = false;
        self.crb_inertias.fresh = false;
        self.invalidate_velocity();
    }

    fn invalidate_velocity(&mut self) {
        self.twists.fresh = false;
        self.bias_accelerations.fresh = false;
    }

    pub fn configuration(&self) -> &DVector<T> {
        &self.q
    }

    pub fn velocity(&self) -> &DVector<T> {
        &self.v
    }

    pub fn set_configuration(&mut self, q: &[T]) -> Result<()> {
        DynamicsError::check_dimension(self.q.len(), q.len())?;
        self.q.copy_from_slice(q);
        self.invalidate_configuration();
        Ok(())
    }

    pub fn set_velocity(&mut self, v: &[T]) -> Result<()> {
        DynamicsError::check_dimension(self.v.len(), v.len())?;
        self.v.copy_from_slice(v);
        self.invalidate_velocity();
        Ok(())
    }

    /// Mutable access to `q`. Invalidates all cached quantities.
    pub fn configuration_mut(&mut self) -> &mut [T] {
        self.invalidate_configuration();
        self.q.as_mut_slice()
    }

    /// Mutable access to `v`. Invalidates the velocity dependent quantities.
    pub fn velocity_mut(&mut self) -> &mut [T] {
        self.invalidate_velocity();
        self.v.as_mut_slice()
    }

    pub fn joint_configuration(&self, joint: JointId) -> Result<&[T]> {
        Ok(&self.q.as_slice()[self.mechanism.q_range(joint)?])
    }

    pub fn joint_velocity(&self, joint: JointId) -> Result<&[T]> {
        Ok(&self.v.as_slice()[self.mechanism.v_range(joint)?])
    }

    pub fn set_joint_configuration(&mut self, joint: JointId, q: &[T]) -> Result<()> {
        let range = self.mechanism.q_range(joint)?;
        DynamicsError::check_dimension(range.len(), q.len())?;
        self.q.as_mut_slice()[range].copy_from_slice(q);
        self.invalidate_configuration();
        Ok(())
    }

    pub fn set_joint_velocity(&mut self, joint: JointId, v: &[T]) -> Result<()> {
        let range = self.mechanism.v_range(joint)?;
        DynamicsError::check_dimension(range.len(), v.len())?;
        self.v.as_mut_slice()[range].copy_from_slice(v);
        self.invalidate_velocity();
        Ok(())
    }

    /// Sets every joint to its zero configuration (identity quaternions for ball and floating
    /// joints)
    pub fn zero_configuration(&mut self) -> Result<()> {
        let mechanism = self.mechanism;
        for joint in mechanism.tree_joints() {
            let range = mechanism.q_range(joint.id())?;
            joint.zero_configuration(&mut self.q.as_mut_slice()[range])?;
        }
        self.invalidate_configuration();
        Ok(())
    }

    pub fn zero_velocity(&mut self) {
        self.v.fill(T::zero());
        self.invalidate_velocity();
    }

    pub fn zero(&mut self) -> Result<()> {
        self.zero_configuration()?;
        self.zero_velocity();
        Ok(())
    }

    /// Renormalizes quaternions, e.g., after numerical integration
    pub fn normalize_configuration(&mut self) -> Result<()> {
        let mechanism = self.mechanism;
        for joint in mechanism.tree_joints() {
            let range = mechanism.q_range(joint.id())?;
            joint.normalize_configuration(&mut self.q.as_mut_slice()[range])?;
        }
        self.invalidate_configuration();
        Ok(())
    }

    /// Time derivative of `q` for the current `v`
    pub fn configuration_derivative_into(&self, qdot: &mut [T]) -> Result<()> {
        DynamicsError::check_dimension(self.q.len(), qdot.len())?;
        for joint in self.mechanism.tree_joints() {
            let (q_range, v_range) = (self.mechanism.q_range(joint.id())?, self.mechanism.v_range(joint.id())?);
            joint.configuration_derivative(
                &self.q.as_slice()[q_range.clone()],
                &self.v.as_slice()[v_range],
                &mut qdot[q_range],
            )?;
        }
        Ok(())
    }

    pub fn configuration_derivative(&self) -> Result<DVector<T>> {
        let mut qdot = DVector::zeros(self.q.len());
        self.configuration_derivative_into(qdot.as_mut_slice())?;
        Ok(qdot)
    }

    /// Brings the requested quantities (and everything they depend on) up to date
    pub(crate) fn ensure(&mut self, quantities: &[CachedQuantity]) -> Result<()> {
        for quantity in quantities {
            match quantity {
                CachedQuantity::Transforms => self.update_transforms()?,
                CachedQuantity::MotionSubspaces => self.update_motion_subspaces()?,
                CachedQuantity::Twists => self.update_twists()?,
                CachedQuantity::BiasAccelerations => self.update_bias_accelerations()?,
                CachedQuantity::Inertias => self.update_inertias()?,
                CachedQuantity::CompositeInertias => self.update_crb_inertias()?,
            }
        }
        Ok(())
    }

    fn update_transforms(&mut self) -> Result<()> {
        if self.transforms.fresh {
            return Ok(());
        }
        trace!("Recomputing transforms to root");
        let mechanism = self.mechanism;
        for node in mechanism.tree().iter().skip(1) {
            let (index, parent) = (node.index().0, parent_index(node)?);
            let segment = &mechanism.segments()[index];
            let joint = node.get().tree_joint()?;
            let q = &self.q.as_slice()[segment.q_start..segment.q_start + joint.num_positions()];
            let to_root = self.transforms.data[parent]
                .compose(&segment.before_to_predecessor)?
                .compose(&joint.joint_transform(q)?)?
                .compose(&segment.successor_to_after)?;
            self.transforms.data[index] = to_root;
        }
        self.transforms.fresh = true;
        Ok(())
    }

    fn update_motion_subspaces(&mut self) -> Result<()> {
        if self.motion_subspaces.fresh {
            return Ok(());
        }
        self.update_transforms()?;
        trace!("Recomputing motion subspaces");
        let mechanism = self.mechanism;
        for node in mechanism.tree().iter().skip(1) {
            let index = node.index().0;
            let joint = node.get().tree_joint()?;
            let after_to_root = self.transforms.data[index].compose(&mechanism.segments()[index].successor_to_after.inverse())?;
            let subspace = &mut self.motion_subspaces.data[index];
            for column in 0..joint.num_velocities() {
                let (angular, linear) = joint.motion_subspace_column(column);
                let (angular, linear) = after_to_root.apply_motion(&angular, &linear);
                subspace.set_column(column, &angular, &linear);
            }
        }
        self.motion_subspaces.fresh = true;
        Ok(())
    }

    fn update_twists(&mut self) -> Result<()> {
        if self.twists.fresh {
            return Ok(());
        }
        self.update_motion_subspaces()?;
        trace!("Recomputing twists");
        let mechanism = self.mechanism;
        for node in mechanism.tree().iter().skip(1) {
            let (index, parent) = (node.index().0, parent_index(node)?);
            let v_start = mechanism.segments()[index].v_start;
            let subspace = &self.motion_subspaces.data[index];
            let joint_twist = subspace.twist(&self.v.as_slice()[v_start..v_start + subspace.ncols()])?;
            self.twists.data[index] = self.twists.data[parent].add(&joint_twist)?;
        }
        self.twists.fresh = true;
        Ok(())
    }

    fn update_bias_accelerations(&mut self) -> Result<()> {
        if self.bias_accelerations.fresh {
            return Ok(());
        }
        self.update_twists()?;
        trace!("Recomputing bias accelerations");
        let mechanism = self.mechanism;
        for node in mechanism.tree().iter().skip(1) {
            let (index, parent) = (node.index().0, parent_index(node)?);
            let segment = &mechanism.segments()[index];
            let joint = node.get().tree_joint()?;
            let subspace = &self.motion_subspaces.data[index];
            let v = &self.v.as_slice()[segment.v_start..segment.v_start + subspace.ncols()];
            let q = &self.q.as_slice()[segment.q_start..segment.q_start + joint.num_positions()];

            let joint_twist = subspace.twist(v)?;
            let after_to_root = self.transforms.data[index].compose(&segment.successor_to_after.inverse())?;
            let joint_bias = joint.bias_acceleration(q, v)?.transform(&after_to_root)?;
            // Velocity product of the parent's motion and the joint's motion, both relative to
            // the parent
            let velocity_product = self.twists.data[parent].cross(&joint_twist)?;
            let relative = SpatialAcceleration::new(
                subspace.body(),
                subspace.base(),
                velocity_product.frame(),
                velocity_product.angular() + joint_bias.angular(),
                velocity_product.linear() + joint_bias.linear(),
            );
            let bias = self.bias_accelerations.data[parent].add(&relative)?;
            self.bias_accelerations.data[index] = bias;
        }
        self.bias_accelerations.fresh = true;
        Ok(())
    }

    fn update_inertias(&mut self) -> Result<()> {
        if self.inertias.fresh {
            return Ok(());
        }
        self.update_transforms()?;
        trace!("Recomputing spatial inertias");
        let root = self.mechanism.root_frame();
        for (index, body) in self.mechanism.bodies().enumerate() {
            self.inertias.data[index] = match body.inertia() {
                Some(inertia) => inertia.transform(&self.transforms.data[index])?,
                None => SpatialInertia::zero(root),
            };
        }
        self.inertias.fresh = true;
        Ok(())
    }

    fn update_crb_inertias(&mut self) -> Result<()> {
        if self.crb_inertias.fresh {
            return Ok(());
        }
        self.update_inertias()?;
        trace!("Recomputing composite rigid body inertias");
        self.crb_inertias.data.clone_from_slice(&self.inertias.data);
        let mechanism = self.mechanism;
        for node in mechanism.tree().iter().skip(1).rev() {
            let (index, parent) = (node.index().0, parent_index(node)?);
            let child = self.crb_inertias.data[index];
            self.crb_inertias.data[parent].add_assign(&child)?;
        }
        self.crb_inertias.fresh = true;
        Ok(())
    }

    /// Per-body data for the algorithms; the caller must [Self::ensure] freshness first
    pub(crate) fn cached_motion_subspaces(&self) -> &[GeometricJacobian<T>] {
        &self.motion_subspaces.data
    }

    pub(crate) fn cached_twists(&self) -> &[Twist<T>] {
        &self.twists.data
    }

    pub(crate) fn cached_bias_accelerations(&self) -> &[SpatialAcceleration<T>] {
        &self.bias_accelerations.data
    }

    pub(crate) fn cached_inertias(&self) -> &[SpatialInertia<T>] {
        &self.inertias.data
    }

    pub(crate) fn cached_crb_inertias(&self) -> &[SpatialInertia<T>] {
        &self.crb_inertias.data
    }

    /// Transform from `frame` to the root frame
    pub fn transform_to_root(&mut self, frame: CoordinateFrame) -> Result<Transform3D<T>> {
        let index = self.mechanism.frame_index(frame)?;
        self.update_transforms()?;
        let definition = self.mechanism.node(index)?.get().body().frame_definition(frame)?;
        self.transforms.data[index.0].compose(definition)
    }

    /// Transform from `from` to `to`
    pub fn relative_transform(&mut self, from: CoordinateFrame, to: CoordinateFrame) -> Result<Transform3D<T>> {
        let to_root = self.transform_to_root(to)?;
        to_root.inverse().compose(&self.transform_to_root(from)?)
    }

    /// Twist of the body's default frame with respect to the root, expressed in the root frame
    pub fn twist_wrt_world(&mut self, body: BodyId) -> Result<Twist<T>> {
        let index = self.mechanism.index_of(body)?;
        self.update_twists()?;
        Ok(self.twists.data[index.0])
    }

    /// Twist of `body_frame` with respect to `base_frame`, expressed in the root frame
    pub fn relative_twist(&mut self, body_frame: CoordinateFrame, base_frame: CoordinateFrame) -> Result<Twist<T>> {
        let (body, base) = (
            self.mechanism.frame_index(body_frame)?,
            self.mechanism.frame_index(base_frame)?,
        );
        self.update_twists()?;
        let relative = self.twists.data[body.0].sub(&self.twists.data[base.0])?;
        Ok(relative.with_frames(body_frame, base_frame))
    }

    /// Acceleration of the body with respect to the root for zero joint accelerations (excluding
    /// gravity), expressed in the root frame
    pub fn bias_acceleration(&mut self, body: BodyId) -> Result<SpatialAcceleration<T>> {
        let index = self.mechanism.index_of(body)?;
        self.update_bias_accelerations()?;
        Ok(self.bias_accelerations.data[index.0])
    }

    /// Inertia of the body expressed in the root frame
    pub fn spatial_inertia(&mut self, body: BodyId) -> Result<SpatialInertia<T>> {
        let index = self.mechanism.index_of(body)?;
        self.update_inertias()?;
        Ok(self.inertias.data[index.0])
    }

    /// Composite inertia of the sub-tree rooted at the body, expressed in the root frame
    pub fn crb_inertia(&mut self, body: BodyId) -> Result<SpatialInertia<T>> {
        let index = self.mechanism.index_of(body)?;
        self.update_crb_inertias()?;
        Ok(self.crb_inertias.data[index.0])
    }

    /// Motion subspace of a tree joint expressed in the root frame, annotated with the successor
    /// and predecessor default frames
    pub fn motion_subspace(&mut self, joint: JointId) -> Result<GeometricJacobian<T>> {
        let index = self.mechanism.joint_index(joint)?;
        self.update_motion_subspaces()?;
        Ok(self.motion_subspaces.data[index.0].clone())
    }

    /// Number of rows of the constraint Jacobian
    pub fn num_constraints(&self) -> usize {
        self.mechanism
            .non_tree_joints()
            .iter()
            .map(|lj| lj.joint().joint_type().num_constraints())
            .sum()
    }

    /// Writes the Jacobian of the loop joint constraints: for every non-tree joint, the rows are
    /// the joint's constraint wrenches applied to the relative twist of its successor with
    /// respect to its predecessor. The constraints hold iff `jacobian * v == 0`.
    pub fn constraint_jacobian_into(&mut self, jacobian: &mut DMatrix<T>) -> Result<()> {
        DynamicsError::check_dimension(self.num_constraints(), jacobian.nrows())?;
        DynamicsError::check_dimension(self.v.len(), jacobian.ncols())?;
        self.update_motion_subspaces()?;
        jacobian.fill(T::zero());
        let mechanism = self.mechanism;
        let mut row = 0;
        for loop_joint in mechanism.non_tree_joints() {
            let joint = loop_joint.joint();
            let path = mechanism.path(loop_joint.predecessor(), loop_joint.successor())?;
            let wrenches = joint
                .constraint_wrench_subspace()
                .transform(&self.transform_to_root(joint.frame_after())?)?;
            for edge in path.edges() {
                let subspace = &self.motion_subspaces.data[edge.index.0];
                let v_start = mechanism.segments()[edge.index.0].v_start;
                let sign = match edge.direction {
                    crate::mechanism::PathDirection::Up => -T::one(),
                    crate::mechanism::PathDirection::Down => T::one(),
                };
                for k in 0..wrenches.ncols() {
                    for column in 0..subspace.ncols() {
                        jacobian[(row + k, v_start + column)] = sign * wrenches.power(k, subspace, column)?;
                    }
                }
            }
            row += wrenches.ncols();
        }
        Ok(())
    }

    pub fn constraint_jacobian(&mut self) -> Result<DMatrix<T>> {
        let mut jacobian = DMatrix::zeros(self.num_constraints(), self.v.len());
        self.constraint_jacobian_into(&mut jacobian)?;
        Ok(jacobian)
    }
}

/// Sets the state of a maximal coordinate mechanism (see [Mechanism::to_maximal_coordinates])
/// such that every body has the pose and twist it has in the tree state
pub fn set_maximal_coordinates<T: Scalar>(
    tree_state: &mut MechanismState<'_, T>,
    maximal_state: &mut MechanismState<'_, T>,
) -> Result<()> {
    let maximal = maximal_state.mechanism();
    DynamicsError::check_dimension(tree_state.mechanism().num_bodies(), maximal.num_bodies())?;
    for joint in maximal.tree_joints() {
        if !joint.joint_type().is_floating() {
            return Err(DynamicsError::TopologyViolation(format!(
                "{joint} is not a floating joint"
            )));
        }
        let body = maximal.successor(joint.id())?;
        let frame = body.default_frame();
        let to_root = tree_state.transform_to_root(frame)?;
        let twist = tree_state
            .twist_wrt_world(body.id())?
            .transform(&to_root.inverse())?;
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*to_root.rotation()));
        let translation = to_root.translation();
        maximal_state.set_joint_configuration(
            joint.id(),
            &[
                rotation.w,
                rotation.i,
                rotation.j,
                rotation.k,
                translation.x,
                translation.y,
                translation.z,
            ],
        )?;
        let (angular, linear) = (twist.angular(), twist.linear());
        maximal_state.set_joint_velocity(
            joint.id(),
            &[angular.x, angular.y, angular.z, linear.x, linear.y, linear.z],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::EntityKind, models};
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    #[test]
    fn cache_invalidation() {
        let mechanism = models::double_pendulum::<f64>().unwrap();
        let mut state = MechanismState::new(&mechanism).unwrap();
        let lower = mechanism.find_body("lower").unwrap().id();
        assert!(!state.is_fresh(CachedQuantity::Transforms));
        state.twist_wrt_world(lower).unwrap();
        assert!(state.is_fresh(CachedQuantity::Transforms));
        assert!(state.is_fresh(CachedQuantity::Twists));
        assert!(!state.is_fresh(CachedQuantity::Inertias));

        state.set_velocity(&[1.0, 0.0]).unwrap();
        assert!(state.is_fresh(CachedQuantity::Transforms));
        assert!(!state.is_fresh(CachedQuantity::Twists));

        state.configuration_mut()[0] = 0.5;
        assert!(!state.is_fresh(CachedQuantity::Transforms));
        assert!(matches!(
            state.set_configuration(&[0.0]),
            Err(DynamicsError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn pendulum_kinematics() {
        let mechanism = models::double_pendulum::<f64>().unwrap();
        let mut state = MechanismState::new(&mechanism).unwrap();
        let lower = mechanism.find_body("lower").unwrap();
        // Rotating the shoulder about y by 90 degrees swings the hanging arm to -x
        state.set_configuration(&[std::f64::consts::FRAC_PI_2, 0.0]).unwrap();
        state.set_velocity(&[1.0, 0.0]).unwrap();
        let to_root = state.transform_to_root(lower.default_frame()).unwrap();
        assert_abs_diff_eq!(*to_root.translation(), Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);

        let twist = state.twist_wrt_world(lower.id()).unwrap();
        assert_abs_diff_eq!(*twist.angular(), Vector3::y(), epsilon = 1e-12);
        let velocity = twist.point_velocity(&to_root.transform_point(&crate::spatial::Point3D::origin(lower.default_frame())).unwrap()).unwrap();
        assert_abs_diff_eq!(*velocity.coords(), Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);

        let unknown = CoordinateFrame::new();
        assert!(matches!(
            state.transform_to_root(unknown),
            Err(DynamicsError::UnknownEntity { kind: EntityKind::Frame, .. })
        ));
    }

    #[test]
    fn crb_of_root_is_total_inertia() {
        let mechanism = models::double_pendulum::<f64>().unwrap();
        let mut state = MechanismState::new(&mechanism).unwrap();
        state.set_configuration(&[0.3, -0.7]).unwrap();
        let root = mechanism.root_body().id();
        let total = state.crb_inertia(root).unwrap();
        assert_abs_diff_eq!(total.mass(), mechanism.total_mass(), epsilon = 1e-12);
        let sum = mechanism
            .bodies()
            .skip(1)
            .map(|body| state.spatial_inertia(body.id()).unwrap())
            .fold(SpatialInertia::zero(mechanism.root_frame()), |acc, inertia| acc.add(&inertia).unwrap());
        assert_abs_diff_eq!(total.to_matrix(), sum.to_matrix(), epsilon = 1e-12);
    }
}
