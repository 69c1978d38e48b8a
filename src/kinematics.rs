//! Kinematic quantities of a whole mechanism in a given state: center of mass, geometric
//! Jacobians, momentum and energies. All results are expressed in the root frame.

use crate::{
    errors::{DynamicsError, Result},
    mechanism::TreePath,
    spatial::{check_frames, FreeVector3D, GeometricJacobian, Momentum, Point3D},
    state::{CachedQuantity, MechanismState},
    Scalar,
};
use tracing::instrument;

/// Center of mass of all bodies (including the root if it has an inertia)
pub fn center_of_mass<T: Scalar>(state: &mut MechanismState<'_, T>) -> Result<Point3D<T>> {
    state.ensure(&[CachedQuantity::Inertias])?;
    let (mass, weighted) = state
        .cached_inertias()
        .iter()
        .fold((T::zero(), nalgebra::Vector3::zeros()), |(mass, weighted), inertia| {
            (mass + inertia.mass(), weighted + inertia.cross_part())
        });
    if mass <= T::zero() {
        return Err(DynamicsError::SingularSystem(
            "center of mass of a massless mechanism".to_string(),
        ));
    }
    Ok(Point3D::new(state.mechanism().root_frame(), weighted / mass))
}

/// Writes the Jacobian mapping `v` to the twist of the path's target with respect to its
/// source. Columns of joints off the path are zero.
#[instrument(skip_all)]
pub fn geometric_jacobian_into<T: Scalar>(
    state: &mut MechanismState<'_, T>,
    path: &TreePath,
    jacobian: &mut GeometricJacobian<T>,
) -> Result<()> {
    DynamicsError::check_dimension(state.num_velocities(), jacobian.ncols())?;
    let mechanism = state.mechanism();
    let (body, base) = (
        mechanism.body(path.target())?.default_frame(),
        mechanism.body(path.source())?.default_frame(),
    );
    state.ensure(&[CachedQuantity::MotionSubspaces])?;
    jacobian.set_frames(body, base, mechanism.root_frame());
    jacobian.fill_zero();
    let subspaces = state.cached_motion_subspaces();
    for edge in path.edges() {
        let subspace = &subspaces[edge.index.0];
        let v_start = mechanism.segments()[edge.index.0].v_start;
        for column in 0..subspace.ncols() {
            let (angular, linear) = subspace.column(column);
            let sign = edge.direction.sign::<T>();
            jacobian.set_column(v_start + column, &(angular * sign), &(linear * sign));
        }
    }
    Ok(())
}

pub fn geometric_jacobian<T: Scalar>(
    state: &mut MechanismState<'_, T>,
    path: &TreePath,
) -> Result<GeometricJacobian<T>> {
    let root = state.mechanism().root_frame();
    let mut jacobian = GeometricJacobian::zeros(root, root, root, state.num_velocities());
    geometric_jacobian_into(state, path, &mut jacobian)?;
    Ok(jacobian)
}

/// Total momentum of all bodies with respect to the root
pub fn momentum<T: Scalar>(state: &mut MechanismState<'_, T>) -> Result<Momentum<T>> {
    state.ensure(&[CachedQuantity::Inertias, CachedQuantity::Twists])?;
    let mut total = Momentum::zero(state.mechanism().root_frame());
    for (inertia, twist) in state.cached_inertias().iter().zip(state.cached_twists()) {
        total = total.add(&inertia.momentum(twist)?)?;
    }
    Ok(total)
}

pub fn kinetic_energy<T: Scalar>(state: &mut MechanismState<'_, T>) -> Result<T> {
    state.ensure(&[CachedQuantity::Inertias, CachedQuantity::Twists])?;
    state
        .cached_inertias()
        .iter()
        .zip(state.cached_twists())
        .try_fold(T::zero(), |energy, (inertia, twist)| {
            Ok(energy + inertia.kinetic_energy(twist)?)
        })
}

/// Potential energy in the mechanism's gravity field, zero when the center of mass is at the
/// root frame origin
pub fn gravitational_potential_energy<T: Scalar>(state: &mut MechanismState<'_, T>) -> Result<T> {
    state.ensure(&[CachedQuantity::Inertias])?;
    let gravity = state.mechanism().gravity();
    state.cached_inertias().iter().try_fold(T::zero(), |energy, inertia| {
        check_frames(gravity.frame(), inertia.frame())?;
        Ok(energy - gravity.coords().dot(inertia.cross_part()))
    })
}

/// Velocity of a point fixed to the body its frame is attached to, expressed in the root frame
pub fn point_velocity<T: Scalar>(state: &mut MechanismState<'_, T>, point: &Point3D<T>) -> Result<FreeVector3D<T>> {
    let mechanism = state.mechanism();
    let body = mechanism.frame_owner(point.frame())?;
    let point = state.transform_to_root(point.frame())?.transform_point(point)?;
    state.twist_wrt_world(body)?.point_velocity(&point)
}
