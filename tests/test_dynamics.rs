use approx::assert_abs_diff_eq;
use nalgebra::{DMatrix, DVector};
use rigid_dynamics::{
    dynamics::{self, DynamicsResult},
    kinematics, models, Mechanism, MechanismState,
};
use std::f64::consts::FRAC_PI_2;

const G: f64 = 9.81;

/// Sample configuration with normalized quaternions
fn sample_state<'a>(mechanism: &'a Mechanism<f64>, seed: f64) -> MechanismState<'a, f64> {
    let mut state = MechanismState::new(mechanism).unwrap();
    let q = state
        .configuration()
        .iter()
        .enumerate()
        .map(|(i, q)| q + (seed * (i + 1) as f64).sin())
        .collect::<Vec<_>>();
    state.set_configuration(&q).unwrap();
    state.normalize_configuration().unwrap();
    let v = (0..state.num_velocities())
        .map(|i| (seed + 0.7 * i as f64).cos())
        .collect::<Vec<_>>();
    state.set_velocity(&v).unwrap();
    state
}

/// Closed form gravity torques of the unit double pendulum (point masses at the rod centers)
fn pendulum_gravity(q1: f64, q2: f64) -> [f64; 2] {
    let lower = 0.5 * G * (q1 + q2).sin();
    [1.5 * G * q1.sin() + lower, lower]
}

#[test_log::test]
fn double_pendulum_closed_form() {
    let mechanism = models::double_pendulum::<f64>().unwrap();
    let mut state = MechanismState::new(&mechanism).unwrap();
    state.set_configuration(&[FRAC_PI_2, 0.0]).unwrap();

    let mass_matrix = dynamics::mass_matrix(&mut state).unwrap();
    let expected = DMatrix::from_row_slice(2, 2, &[8.0 / 3.0, 5.0 / 6.0, 5.0 / 6.0, 1.0 / 3.0]);
    assert_abs_diff_eq!(mass_matrix, expected, epsilon = 1e-9);

    let torques = dynamics::inverse_dynamics(&mut state, &[0.0, 0.0], None).unwrap();
    assert_abs_diff_eq!(torques, DVector::from_vec(vec![19.62, 4.905]), epsilon = 1e-9);
}

#[test]
fn double_pendulum_gravity_torques() {
    let mechanism = models::double_pendulum::<f64>().unwrap();
    let mut state = MechanismState::new(&mechanism).unwrap();
    for (q1, q2) in [(0.0, 0.0), (0.3, -1.2), (-2.0, 0.5), (3.0, 3.0)] {
        state.set_configuration(&[q1, q2]).unwrap();
        let torques = dynamics::inverse_dynamics(&mut state, &[0.0, 0.0], None).unwrap();
        let expected = pendulum_gravity(q1, q2);
        assert_abs_diff_eq!(torques[0], expected[0], epsilon = 1e-9);
        assert_abs_diff_eq!(torques[1], expected[1], epsilon = 1e-9);
    }
}

#[test]
fn double_pendulum_velocity_products() {
    let mechanism = models::double_pendulum::<f64>().unwrap();
    let mut state = MechanismState::new(&mechanism).unwrap();
    let (q1, q2, qd1, qd2) = (0.4, 0.9, 1.3, -0.6);
    state.set_configuration(&[q1, q2]).unwrap();
    state.set_velocity(&[qd1, qd2]).unwrap();
    let torques = dynamics::inverse_dynamics(&mut state, &[0.0, 0.0], None).unwrap();

    let h = 0.5 * q2.sin();
    let gravity = pendulum_gravity(q1, q2);
    assert_abs_diff_eq!(
        torques[0],
        -h * (2.0 * qd1 * qd2 + qd2 * qd2) + gravity[0],
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(torques[1], h * qd1 * qd1 + gravity[1], epsilon = 1e-9);
}

#[test]
fn mass_matrix_is_symmetric_positive_definite() {
    for mechanism in [
        models::floating_chain::<f64>(5).unwrap(),
        models::arm_with_fixed_joints::<f64>().unwrap(),
    ] {
        for seed in [0.1, 0.7, 2.3] {
            let mut state = sample_state(&mechanism, seed);
            let mass_matrix = dynamics::mass_matrix(&mut state).unwrap();
            assert_abs_diff_eq!(mass_matrix, mass_matrix.transpose(), epsilon = 1e-12);
            let eigenvalues = mass_matrix.clone().symmetric_eigenvalues();
            assert!(eigenvalues.iter().all(|value| *value > 0.0), "{eigenvalues}");
        }
    }
}

#[test_log::test]
fn forward_inverse_round_trip() {
    let mechanism = models::floating_chain::<f64>(4).unwrap();
    let mut state = sample_state(&mechanism, 1.1);
    let vdot = (0..state.num_velocities())
        .map(|i| 0.5 - (i as f64 * 0.31).sin())
        .collect::<Vec<_>>();
    let torques = dynamics::inverse_dynamics(&mut state, &vdot, None).unwrap();

    let mut result = DynamicsResult::new(&mechanism);
    dynamics::dynamics(&mut result, &mut state, torques.as_slice(), None).unwrap();
    assert_abs_diff_eq!(*result.vdot(), DVector::from_vec(vdot.clone()), epsilon = 1e-8);

    // τ = M v̇ + c
    let reconstructed = result.mass_matrix() * DVector::from_vec(vdot) + result.dynamics_bias();
    assert_abs_diff_eq!(reconstructed, torques, epsilon = 1e-9);

    // The preallocated result can be reused
    state.zero_velocity();
    dynamics::dynamics(&mut result, &mut state, torques.as_slice(), None).unwrap();
    let allocated = dynamics::forward_dynamics(&mut state, torques.as_slice(), None).unwrap();
    assert_abs_diff_eq!(*result.vdot(), allocated, epsilon = 1e-12);
}

#[test]
fn kinetic_energy_from_mass_matrix() {
    for mechanism in [
        models::floating_chain::<f64>(3).unwrap(),
        models::arm_with_fixed_joints::<f64>().unwrap(),
    ] {
        let mut state = sample_state(&mechanism, 0.45);
        let mass_matrix = dynamics::mass_matrix(&mut state).unwrap();
        let v = state.velocity().clone();
        let quadratic = 0.5 * v.dot(&(&mass_matrix * &v));
        let energy = kinematics::kinetic_energy(&mut state).unwrap();
        assert_abs_diff_eq!(quadratic, energy, epsilon = 1e-10);
    }
}

#[test]
fn single_precision() {
    let mechanism = models::double_pendulum::<f32>().unwrap();
    let mut state = MechanismState::new(&mechanism).unwrap();
    state.set_configuration(&[std::f32::consts::FRAC_PI_2, 0.0]).unwrap();
    let mass_matrix = dynamics::mass_matrix(&mut state).unwrap();
    assert_abs_diff_eq!(mass_matrix[(0, 0)], 8.0 / 3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(mass_matrix[(0, 1)], 5.0 / 6.0, epsilon = 1e-5);
    let torques = dynamics::inverse_dynamics(&mut state, &[0.0, 0.0], None).unwrap();
    assert_abs_diff_eq!(torques[0], 19.62, epsilon = 1e-4);
    let vdot = dynamics::forward_dynamics(&mut state, torques.as_slice(), None).unwrap();
    assert_abs_diff_eq!(vdot.norm(), 0.0, epsilon = 1e-4);
}
