//! Spatial force vectors: wrenches and momenta, stored as `[angular; linear]` and expressed in a frame.

use super::frame::{check_frames, CoordinateFrame};
use super::motion::Twist;
use super::transform::Transform3D;
use super::util::force_cross;
use crate::{errors::Result, Scalar};
use nalgebra::Vector3;

/// Torque (about the origin of `frame`) and force, expressed in `frame`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wrench<T: Scalar> {
    frame: CoordinateFrame,
    angular: Vector3<T>,
    linear: Vector3<T>,
}

impl<T: Scalar> Wrench<T> {
    pub fn new(frame: CoordinateFrame, angular: Vector3<T>, linear: Vector3<T>) -> Self {
        Self { frame, angular, linear }
    }

    pub fn zero(frame: CoordinateFrame) -> Self {
        Self::new(frame, Vector3::zeros(), Vector3::zeros())
    }

    pub fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    pub fn angular(&self) -> &Vector3<T> {
        &self.angular
    }

    pub fn linear(&self) -> &Vector3<T> {
        &self.linear
    }

    pub fn add(&self, other: &Wrench<T>) -> Result<Wrench<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(Wrench::new(
            self.frame,
            self.angular + other.angular,
            self.linear + other.linear,
        ))
    }

    pub fn sub(&self, other: &Wrench<T>) -> Result<Wrench<T>> {
        self.add(&-*other)
    }

    pub fn transform(&self, transform: &Transform3D<T>) -> Result<Wrench<T>> {
        check_frames(transform.from(), self.frame)?;
        let (angular, linear) = transform.apply_force(&self.angular, &self.linear);
        Ok(Wrench::new(transform.to(), angular, linear))
    }

    /// Mechanical power delivered by this wrench to a body moving with `twist`
    pub fn power(&self, twist: &Twist<T>) -> Result<T> {
        check_frames(self.frame, twist.frame())?;
        Ok(self.angular.dot(twist.angular()) + self.linear.dot(twist.linear()))
    }
}

impl<T: Scalar> std::ops::Neg for Wrench<T> {
    type Output = Wrench<T>;

    fn neg(self) -> Self::Output {
        Wrench::new(self.frame, -self.angular, -self.linear)
    }
}

/// Angular and linear momentum expressed in `frame`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum<T: Scalar> {
    frame: CoordinateFrame,
    angular: Vector3<T>,
    linear: Vector3<T>,
}

impl<T: Scalar> Momentum<T> {
    pub fn new(frame: CoordinateFrame, angular: Vector3<T>, linear: Vector3<T>) -> Self {
        Self { frame, angular, linear }
    }

    pub fn zero(frame: CoordinateFrame) -> Self {
        Self::new(frame, Vector3::zeros(), Vector3::zeros())
    }

    pub fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    pub fn angular(&self) -> &Vector3<T> {
        &self.angular
    }

    pub fn linear(&self) -> &Vector3<T> {
        &self.linear
    }

    pub fn add(&self, other: &Momentum<T>) -> Result<Momentum<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(Momentum::new(
            self.frame,
            self.angular + other.angular,
            self.linear + other.linear,
        ))
    }

    pub fn transform(&self, transform: &Transform3D<T>) -> Result<Momentum<T>> {
        check_frames(transform.from(), self.frame)?;
        let (angular, linear) = transform.apply_force(&self.angular, &self.linear);
        Ok(Momentum::new(transform.to(), angular, linear))
    }

    /// Rate of change of this momentum when carried along with `twist`: `twist x* momentum`
    pub fn cross_twist(&self, twist: &Twist<T>) -> Result<Wrench<T>> {
        check_frames(self.frame, twist.frame())?;
        let (angular, linear) = force_cross(twist.angular(), twist.linear(), &self.angular, &self.linear);
        Ok(Wrench::new(self.frame, angular, linear))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Rotation3, Unit};

    #[test]
    fn power_is_frame_invariant() {
        let (a, b, body, base) = (
            CoordinateFrame::new(),
            CoordinateFrame::new(),
            CoordinateFrame::new(),
            CoordinateFrame::new(),
        );
        let axis = Unit::new_normalize(Vector3::new(0.2, 0.1, 1.0));
        let tf = Transform3D::new(
            a,
            b,
            Rotation3::from_axis_angle(&axis, -1.1).into_inner(),
            Vector3::new(0.3, 0.4, -0.5),
        );
        let wrench = Wrench::new(a, Vector3::new(1.0, 0.0, -2.0), Vector3::new(0.5, 3.0, 1.0));
        let twist = Twist::new(body, base, a, Vector3::new(0.0, 1.0, 0.5), Vector3::new(-1.0, 0.2, 0.0));

        let in_a = wrench.power(&twist).unwrap();
        let in_b = wrench
            .transform(&tf)
            .unwrap()
            .power(&twist.transform(&tf).unwrap())
            .unwrap();
        assert_abs_diff_eq!(in_a, in_b, epsilon = 1e-12);
        assert!(wrench.power(&twist.transform(&tf).unwrap()).is_err());
    }

    #[test]
    fn addition_requires_same_frame() {
        let (a, b) = (CoordinateFrame::new(), CoordinateFrame::new());
        let w = Wrench::new(a, Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(w.sub(&w).unwrap(), Wrench::zero(a));
        assert!(w.add(&Wrench::zero(b)).is_err());
        assert!(Momentum::<f64>::zero(a).add(&Momentum::zero(b)).is_err());
    }
}
