//! Joint-space dynamics: the mass matrix by the composite rigid body algorithm, inverse dynamics
//! by the recursive Newton-Euler algorithm and forward dynamics by solving
//! `M(q) v̇ = τ - c(q, v)` with a Cholesky factorization.
//!
//! All algorithms work with quantities expressed in the root frame, so propagating wrenches and
//! inertias up the tree is a plain sum. The `_into` variants and [dynamics] write into
//! preallocated buffers and do not allocate.

use crate::{
    body::BodyId,
    errors::{DynamicsError, Result},
    mechanism::{parent_index, Mechanism},
    spatial::{SpatialAcceleration, Wrench},
    state::{CachedQuantity, MechanismState},
    Scalar,
};
use itertools::izip;
use nalgebra::{DMatrix, DVector, Vector3};
use std::collections::HashMap;
use tracing::instrument;

/// Per-body scratch space of the Newton-Euler recursion
#[derive(Debug, Clone)]
pub struct NewtonEulerBuffers<T: Scalar> {
    accelerations: Vec<SpatialAcceleration<T>>,
    wrenches: Vec<Wrench<T>>,
}

impl<T: Scalar> NewtonEulerBuffers<T> {
    pub fn new(mechanism: &Mechanism<T>) -> Self {
        let root = mechanism.root_frame();
        NewtonEulerBuffers {
            accelerations: vec![SpatialAcceleration::zero(root, root, root); mechanism.num_bodies()],
            wrenches: vec![Wrench::zero(root); mechanism.num_bodies()],
        }
    }

    /// Spatial accelerations with respect to the root (including gravity) of the last run, in
    /// depth-first body order
    pub fn accelerations(&self) -> &[SpatialAcceleration<T>] {
        &self.accelerations
    }

    /// Wrenches transmitted by each body's joint to the body of the last run
    pub fn joint_wrenches(&self) -> &[Wrench<T>] {
        &self.wrenches
    }
}

/// Preallocated outputs and scratch space for [dynamics]
#[derive(Debug, Clone)]
pub struct DynamicsResult<T: Scalar> {
    vdot: DVector<T>,
    mass_matrix: DMatrix<T>,
    dynamics_bias: DVector<T>,
    factor: DMatrix<T>,
    rhs: DVector<T>,
    buffers: NewtonEulerBuffers<T>,
}

impl<T: Scalar> DynamicsResult<T> {
    pub fn new(mechanism: &Mechanism<T>) -> Self {
        let nv = mechanism.num_velocities();
        DynamicsResult {
            vdot: DVector::zeros(nv),
            mass_matrix: DMatrix::zeros(nv, nv),
            dynamics_bias: DVector::zeros(nv),
            factor: DMatrix::zeros(nv, nv),
            rhs: DVector::zeros(nv),
            buffers: NewtonEulerBuffers::new(mechanism),
        }
    }

    /// Joint accelerations
    pub fn vdot(&self) -> &DVector<T> {
        &self.vdot
    }

    pub fn mass_matrix(&self) -> &DMatrix<T> {
        &self.mass_matrix
    }

    /// Torques required for zero joint acceleration: Coriolis, centrifugal, gravitational and
    /// external contributions
    pub fn dynamics_bias(&self) -> &DVector<T> {
        &self.dynamics_bias
    }

    pub fn buffers(&self) -> &NewtonEulerBuffers<T> {
        &self.buffers
    }
}

fn check_state<T: Scalar>(state: &MechanismState<'_, T>, body_count: usize) -> Result<()> {
    DynamicsError::check_dimension(state.mechanism().num_bodies(), body_count)
}

/// Writes the joint-space mass matrix. The upper triangle is computed, the lower triangle
/// mirrored.
#[instrument(skip_all)]
pub fn mass_matrix_into<T: Scalar>(mass_matrix: &mut DMatrix<T>, state: &mut MechanismState<'_, T>) -> Result<()> {
    let nv = state.num_velocities();
    DynamicsError::check_dimension(nv, mass_matrix.nrows())?;
    DynamicsError::check_dimension(nv, mass_matrix.ncols())?;
    state.ensure(&[CachedQuantity::MotionSubspaces, CachedQuantity::CompositeInertias])?;
    let mechanism = state.mechanism();
    let (subspaces, composite) = (state.cached_motion_subspaces(), state.cached_crb_inertias());
    let segments = mechanism.segments();
    let tree = mechanism.tree();

    mass_matrix.fill(T::zero());
    for node in tree.iter().skip(1) {
        let index = node.index();
        let subspace = &subspaces[index.0];
        let column_start = segments[index.0].v_start;
        for column in 0..subspace.ncols() {
            let (angular, linear) = subspace.column(column);
            let (torque, force) = composite[index.0].apply(&angular, &linear);
            // The composite inertia of the sub-tree accelerated by this joint, projected on the
            // joint itself and on every joint between it and the root
            for other in std::iter::once(index).chain(tree.ancestors(index)).filter(|other| other.0 > 0) {
                let other_subspace = &subspaces[other.0];
                let row_start = segments[other.0].v_start;
                for row in 0..other_subspace.ncols() {
                    let (w, v) = other_subspace.column(row);
                    mass_matrix[(row_start + row, column_start + column)] = w.dot(&torque) + v.dot(&force);
                }
            }
        }
    }
    for column in 0..nv {
        for row in column + 1..nv {
            mass_matrix[(row, column)] = mass_matrix[(column, row)];
        }
    }
    Ok(())
}

pub fn mass_matrix<T: Scalar>(state: &mut MechanismState<'_, T>) -> Result<DMatrix<T>> {
    let nv = state.num_velocities();
    let mut result = DMatrix::zeros(nv, nv);
    mass_matrix_into(&mut result, state)?;
    Ok(result)
}

/// Writes the joint torques that produce the joint accelerations `vdot` under gravity and the
/// given external wrenches (applied to bodies, expressed in the root frame).
#[instrument(skip_all)]
pub fn inverse_dynamics_into<T: Scalar>(
    torques: &mut DVector<T>,
    buffers: &mut NewtonEulerBuffers<T>,
    state: &mut MechanismState<'_, T>,
    vdot: &[T],
    external_wrenches: Option<&HashMap<BodyId, Wrench<T>>>,
) -> Result<()> {
    let nv = state.num_velocities();
    DynamicsError::check_dimension(nv, torques.len())?;
    DynamicsError::check_dimension(nv, vdot.len())?;
    check_state(state, buffers.accelerations.len())?;
    state.ensure(&[
        CachedQuantity::MotionSubspaces,
        CachedQuantity::Twists,
        CachedQuantity::BiasAccelerations,
        CachedQuantity::Inertias,
    ])?;
    let mechanism = state.mechanism();
    let root = mechanism.root_frame();
    let segments = mechanism.segments();
    let (subspaces, twists, biases, inertias) = (
        state.cached_motion_subspaces(),
        state.cached_twists(),
        state.cached_bias_accelerations(),
        state.cached_inertias(),
    );

    // Accelerating the root upwards is equivalent to gravity acting on every body
    let gravity = mechanism.gravity();
    buffers.accelerations[0] = SpatialAcceleration::new(root, root, root, Vector3::zeros(), -gravity.coords());

    // Forward pass: accelerations and the wrenches producing them
    for node in mechanism.tree().iter().skip(1) {
        let (index, parent) = (node.index().0, parent_index(node)?);
        let subspace = &subspaces[index];
        let v_start = segments[index].v_start;
        let parent_acceleration = &buffers.accelerations[parent];
        let mut angular = parent_acceleration.angular() + biases[index].angular() - biases[parent].angular();
        let mut linear = parent_acceleration.linear() + biases[index].linear() - biases[parent].linear();
        for column in 0..subspace.ncols() {
            let (w, v) = subspace.column(column);
            angular += w * vdot[v_start + column];
            linear += v * vdot[v_start + column];
        }
        let acceleration = SpatialAcceleration::new(subspace.body(), root, root, angular, linear);
        let mut wrench = inertias[index].newton_euler(&acceleration, &twists[index])?;
        if let Some(external) = external_wrenches.and_then(|wrenches| wrenches.get(&node.load().body().id())) {
            wrench = wrench.sub(external)?;
        }
        buffers.accelerations[index] = acceleration;
        buffers.wrenches[index] = wrench;
    }

    // Backward pass: sum wrenches towards the root and project them on the joint axes
    for node in mechanism.tree().iter().skip(1).rev() {
        let (index, parent) = (node.index().0, parent_index(node)?);
        let wrench = buffers.wrenches[index];
        let subspace = &subspaces[index];
        let v_start = segments[index].v_start;
        for column in 0..subspace.ncols() {
            let (w, v) = subspace.column(column);
            torques[v_start + column] = w.dot(wrench.angular()) + v.dot(wrench.linear());
        }
        if parent > 0 {
            buffers.wrenches[parent] = buffers.wrenches[parent].add(&wrench)?;
        }
    }
    Ok(())
}

pub fn inverse_dynamics<T: Scalar>(
    state: &mut MechanismState<'_, T>,
    vdot: &[T],
    external_wrenches: Option<&HashMap<BodyId, Wrench<T>>>,
) -> Result<DVector<T>> {
    let mechanism = state.mechanism();
    let mut torques = DVector::zeros(mechanism.num_velocities());
    let mut buffers = NewtonEulerBuffers::new(mechanism);
    inverse_dynamics_into(&mut torques, &mut buffers, state, vdot, external_wrenches)?;
    Ok(torques)
}

/// Computes the joint accelerations for the given joint torques and stores them with the mass
/// matrix and dynamics bias in `result`
#[instrument(skip_all)]
pub fn dynamics<T: Scalar>(
    result: &mut DynamicsResult<T>,
    state: &mut MechanismState<'_, T>,
    torques: &[T],
    external_wrenches: Option<&HashMap<BodyId, Wrench<T>>>,
) -> Result<()> {
    DynamicsError::check_dimension(state.num_velocities(), torques.len())?;
    DynamicsError::check_dimension(state.num_velocities(), result.vdot.len())?;
    mass_matrix_into(&mut result.mass_matrix, state)?;

    result.vdot.fill(T::zero());
    let DynamicsResult {
        vdot,
        mass_matrix,
        dynamics_bias,
        factor,
        rhs,
        buffers,
    } = result;
    inverse_dynamics_into(dynamics_bias, buffers, state, vdot.as_slice(), external_wrenches)?;

    for (rhs, torque, bias) in izip!(rhs.iter_mut(), torques, dynamics_bias.iter()) {
        *rhs = *torque - *bias;
    }
    factor.copy_from(mass_matrix);
    cholesky_in_place(factor)?;
    cholesky_solve(factor, rhs, vdot);
    Ok(())
}

pub fn forward_dynamics<T: Scalar>(
    state: &mut MechanismState<'_, T>,
    torques: &[T],
    external_wrenches: Option<&HashMap<BodyId, Wrench<T>>>,
) -> Result<DVector<T>> {
    let mut result = DynamicsResult::new(state.mechanism());
    dynamics(&mut result, state, torques, external_wrenches)?;
    Ok(result.vdot)
}

/// Overwrites the lower triangle of a symmetric positive definite matrix with its Cholesky
/// factor `L` (`A = L Lᵀ`). The upper triangle is left untouched.
fn cholesky_in_place<T: Scalar>(matrix: &mut DMatrix<T>) -> Result<()> {
    let n = matrix.nrows();
    for j in 0..n {
        let mut pivot = matrix[(j, j)];
        for k in 0..j {
            pivot -= matrix[(j, k)] * matrix[(j, k)];
        }
        if pivot <= T::zero() {
            return Err(DynamicsError::SingularSystem(format!(
                "mass matrix is not positive definite (pivot {j})"
            )));
        }
        let pivot = pivot.sqrt();
        matrix[(j, j)] = pivot;
        for i in j + 1..n {
            let mut value = matrix[(i, j)];
            for k in 0..j {
                value -= matrix[(i, k)] * matrix[(j, k)];
            }
            matrix[(i, j)] = value / pivot;
        }
    }
    Ok(())
}

/// Solves `L Lᵀ x = b` by forward and back substitution
fn cholesky_solve<T: Scalar>(factor: &DMatrix<T>, rhs: &DVector<T>, solution: &mut DVector<T>) {
    let n = factor.nrows();
    for i in 0..n {
        let mut value = rhs[i];
        for k in 0..i {
            value -= factor[(i, k)] * solution[k];
        }
        solution[i] = value / factor[(i, i)];
    }
    for i in (0..n).rev() {
        let mut value = solution[i];
        for k in i + 1..n {
            value -= factor[(k, i)] * solution[k];
        }
        solution[i] = value / factor[(i, i)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cholesky_solves_spd_system() {
        let a = DMatrix::from_row_slice(3, 3, &[4.0, 2.0, 0.4, 2.0, 5.0, 1.0, 0.4, 1.0, 3.0]);
        let b = DVector::from_column_slice(&[1.0, -2.0, 0.5]);
        let mut factor = a.clone();
        cholesky_in_place(&mut factor).unwrap();
        let mut x = DVector::zeros(3);
        cholesky_solve(&factor, &b, &mut x);
        assert_abs_diff_eq!(a * x, b, epsilon = 1e-12);

        let mut singular = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(matches!(
            cholesky_in_place(&mut singular),
            Err(DynamicsError::SingularSystem(_))
        ));
    }

    #[test]
    fn massless_mechanism_is_singular() {
        let mut mechanism = Mechanism::new(crate::RigidBody::massless("world"));
        let world = mechanism.root_body().id();
        mechanism
            .add_body(
                world,
                crate::Joint::new("hinge", crate::JointType::revolute(Vector3::z())),
                crate::RigidBody::massless("ghost"),
            )
            .unwrap();
        let mut state = MechanismState::new(&mechanism).unwrap();
        assert!(matches!(
            forward_dynamics(&mut state, &[0.0], None),
            Err(DynamicsError::SingularSystem(_))
        ));
    }

    #[test]
    fn external_wrench_balances_gravity() {
        let mechanism = models::double_pendulum::<f64>().unwrap();
        let mut state = MechanismState::new(&mechanism).unwrap();
        state.set_configuration(&[0.4, -0.3]).unwrap();
        // Pushing every body up with its weight at its center of mass cancels gravity
        let mut external = HashMap::new();
        for body in mechanism.bodies().skip(1) {
            let inertia = state.spatial_inertia(body.id()).unwrap();
            let com = inertia.center_of_mass();
            let force = Vector3::new(0.0, 0.0, 9.81 * inertia.mass());
            external.insert(
                body.id(),
                Wrench::new(mechanism.root_frame(), com.coords().cross(&force), force),
            );
        }
        let torques = inverse_dynamics(&mut state, &[0.0, 0.0], Some(&external)).unwrap();
        assert_abs_diff_eq!(torques, DVector::zeros(2), epsilon = 1e-12);
    }
}
