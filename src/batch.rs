//! Parallel evaluation of the dynamics algorithms for many samples of one mechanism. Every worker
//! thread owns its [MechanismState] and buffers; the mechanism is shared by reference.

use crate::{
    dynamics::{self, DynamicsResult, NewtonEulerBuffers},
    errors::{DynamicsError, Result},
    mechanism::Mechanism,
    state::MechanismState,
    Scalar,
};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::debug;

fn check_lengths(expected: usize, others: &[usize]) -> Result<()> {
    others
        .iter()
        .try_for_each(|&actual| DynamicsError::check_dimension(expected, actual))
}

/// Joint torques for every `(q, v, v̇)` sample
pub fn inverse_dynamics<T: Scalar + Send + Sync>(
    mechanism: &Mechanism<T>,
    configurations: &[DVector<T>],
    velocities: &[DVector<T>],
    accelerations: &[DVector<T>],
) -> Result<Vec<DVector<T>>> {
    check_lengths(configurations.len(), &[velocities.len(), accelerations.len()])?;
    debug!("Inverse dynamics for {} samples", configurations.len());
    configurations
        .par_iter()
        .zip(velocities.par_iter())
        .zip(accelerations.par_iter())
        .map_init(
            || {
                MechanismState::new(mechanism)
                    .map(|state| (state, NewtonEulerBuffers::new(mechanism)))
            },
            |worker, ((q, v), vdot)| {
                let (state, buffers) = worker.as_mut().map_err(|error| error.clone())?;
                state.set_configuration(q.as_slice())?;
                state.set_velocity(v.as_slice())?;
                let mut torques = DVector::zeros(mechanism.num_velocities());
                dynamics::inverse_dynamics_into(&mut torques, buffers, state, vdot.as_slice(), None)?;
                Ok(torques)
            },
        )
        .collect()
}

/// Mass matrix for every configuration
pub fn mass_matrices<T: Scalar + Send + Sync>(
    mechanism: &Mechanism<T>,
    configurations: &[DVector<T>],
) -> Result<Vec<DMatrix<T>>> {
    debug!("Mass matrices for {} samples", configurations.len());
    configurations
        .par_iter()
        .map_init(
            || MechanismState::new(mechanism),
            |state, q| {
                let state = state.as_mut().map_err(|error| error.clone())?;
                state.set_configuration(q.as_slice())?;
                dynamics::mass_matrix(state)
            },
        )
        .collect()
}

/// Joint accelerations for every `(q, v, τ)` sample
pub fn forward_dynamics<T: Scalar + Send + Sync>(
    mechanism: &Mechanism<T>,
    configurations: &[DVector<T>],
    velocities: &[DVector<T>],
    torques: &[DVector<T>],
) -> Result<Vec<DVector<T>>> {
    check_lengths(configurations.len(), &[velocities.len(), torques.len()])?;
    debug!("Forward dynamics for {} samples", configurations.len());
    configurations
        .par_iter()
        .zip(velocities.par_iter())
        .zip(torques.par_iter())
        .map_init(
            || MechanismState::new(mechanism).map(|state| (state, DynamicsResult::new(mechanism))),
            |worker, ((q, v), tau)| {
                let (state, result) = worker.as_mut().map_err(|error| error.clone())?;
                state.set_configuration(q.as_slice())?;
                state.set_velocity(v.as_slice())?;
                dynamics::dynamics(result, state, tau.as_slice(), None)?;
                Ok(result.vdot().clone())
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parallel_matches_sequential() {
        let mechanism = models::double_pendulum::<f64>().unwrap();
        let configurations = (0..16)
            .map(|i| DVector::from_vec(vec![0.1 * i as f64, -0.05 * i as f64]))
            .collect::<Vec<_>>();
        let velocities = vec![DVector::from_vec(vec![0.3, -0.2]); 16];
        let accelerations = vec![DVector::from_vec(vec![1.0, 0.5]); 16];

        let torques = inverse_dynamics(&mechanism, &configurations, &velocities, &accelerations).unwrap();
        let vdots = forward_dynamics(&mechanism, &configurations, &velocities, &torques).unwrap();
        let matrices = mass_matrices(&mechanism, &configurations).unwrap();

        let mut state = MechanismState::new(&mechanism).unwrap();
        for (index, q) in configurations.iter().enumerate() {
            state.set_configuration(q.as_slice()).unwrap();
            state.set_velocity(velocities[index].as_slice()).unwrap();
            let expected = dynamics::inverse_dynamics(&mut state, accelerations[index].as_slice(), None).unwrap();
            assert_abs_diff_eq!(torques[index], expected, epsilon = 1e-12);
            assert_abs_diff_eq!(vdots[index], accelerations[index], epsilon = 1e-9);
            assert_abs_diff_eq!(matrices[index], dynamics::mass_matrix(&mut state).unwrap(), epsilon = 1e-12);
        }

        assert!(matches!(
            inverse_dynamics(&mechanism, &configurations, &velocities[..3], &accelerations),
            Err(DynamicsError::DimensionMismatch { .. })
        ));
    }
}
