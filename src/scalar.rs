//! The scalar capability every algorithm of this crate is written against.
//!
//! Mechanisms, states and the dynamics algorithms are generic over `T: Scalar` so the same code
//! runs with `f64` for simulation and `f32` for lightweight use. Any other type implementing
//! [nalgebra::RealField] (e.g., an expression type for closed-form analysis) can be plugged in.

use nalgebra::RealField;

/// Arithmetic required from configuration, velocity and inertia values.
pub trait Scalar: RealField + Copy {}

impl<T: RealField + Copy> Scalar for T {}

/// Converts a floating point constant into the scalar type
#[inline]
pub fn lit<T: Scalar>(value: f64) -> T {
    nalgebra::convert(value)
}
