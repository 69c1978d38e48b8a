//! Spatial inertia of a rigid body.

use super::force::{Momentum, Wrench};
use super::frame::{check_frames, CoordinateFrame};
use super::motion::{SpatialAcceleration, Twist};
use super::point::Point3D;
use super::transform::Transform3D;
use crate::{errors::Result, Scalar};
use nalgebra::{Matrix3, Matrix6, Vector3};

/// Mass distribution of a rigid body, expressed in `frame`.
///
/// Stored as the rotational inertia about the origin of `frame`, the first mass moment
/// (`mass * center_of_mass`) and the mass. Inertias of bodies rigidly connected to each
/// other are combined by transforming them into a common frame and adding them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialInertia<T: Scalar> {
    frame: CoordinateFrame,
    moment: Matrix3<T>,
    cross_part: Vector3<T>,
    mass: T,
}

impl<T: Scalar> SpatialInertia<T> {
    pub fn new(frame: CoordinateFrame, moment: Matrix3<T>, cross_part: Vector3<T>, mass: T) -> Self {
        Self {
            frame,
            moment,
            cross_part,
            mass,
        }
    }

    /// Inertia from the mass, the center of mass and the rotational inertia about the center of mass
    /// (all expressed in `frame`). Applies the parallel axis theorem.
    pub fn from_com(frame: CoordinateFrame, mass: T, com: Vector3<T>, moment_about_com: Matrix3<T>) -> Self {
        let offset = Matrix3::identity() * com.dot(&com) - com * com.transpose();
        Self::new(frame, moment_about_com + offset * mass, com * mass, mass)
    }

    pub fn zero(frame: CoordinateFrame) -> Self {
        Self::new(frame, Matrix3::zeros(), Vector3::zeros(), T::zero())
    }

    pub fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    pub fn mass(&self) -> T {
        self.mass
    }

    /// Rotational inertia about the origin of [SpatialInertia::frame]
    pub fn moment(&self) -> &Matrix3<T> {
        &self.moment
    }

    /// `mass * center_of_mass`
    pub fn cross_part(&self) -> &Vector3<T> {
        &self.cross_part
    }

    /// Center of mass; the origin for a massless inertia
    pub fn center_of_mass(&self) -> Point3D<T> {
        if self.mass.is_zero() {
            Point3D::origin(self.frame)
        } else {
            Point3D::new(self.frame, self.cross_part / self.mass)
        }
    }

    pub fn add(&self, other: &SpatialInertia<T>) -> Result<SpatialInertia<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(SpatialInertia::new(
            self.frame,
            self.moment + other.moment,
            self.cross_part + other.cross_part,
            self.mass + other.mass,
        ))
    }

    pub(crate) fn add_assign(&mut self, other: &SpatialInertia<T>) -> Result<()> {
        check_frames(self.frame, other.frame)?;
        self.moment += other.moment;
        self.cross_part += other.cross_part;
        self.mass += other.mass;
        Ok(())
    }

    pub fn transform(&self, transform: &Transform3D<T>) -> Result<SpatialInertia<T>> {
        check_frames(transform.from(), self.frame)?;
        let rot = transform.rotation();
        let p = transform.translation();
        let rotated_cross = rot * self.cross_part;
        let p_hat = p.cross_matrix();
        let c_hat = rotated_cross.cross_matrix();
        let moment = rot * self.moment * rot.transpose() - (c_hat * p_hat + p_hat * c_hat) - p_hat * p_hat * self.mass;
        Ok(SpatialInertia::new(
            transform.to(),
            moment,
            rotated_cross + p * self.mass,
            self.mass,
        ))
    }

    /// Raw product with a motion vector `(w, v)` expressed in the same frame
    #[inline]
    pub(crate) fn apply(&self, w: &Vector3<T>, v: &Vector3<T>) -> (Vector3<T>, Vector3<T>) {
        (
            self.moment * w + self.cross_part.cross(v),
            v * self.mass - self.cross_part.cross(w),
        )
    }

    /// Momentum of a body with this inertia moving with `twist`
    pub fn momentum(&self, twist: &Twist<T>) -> Result<Momentum<T>> {
        check_frames(self.frame, twist.frame())?;
        let (angular, linear) = self.apply(twist.angular(), twist.linear());
        Ok(Momentum::new(self.frame, angular, linear))
    }

    /// `I * a`
    pub fn wrench(&self, acceleration: &SpatialAcceleration<T>) -> Result<Wrench<T>> {
        check_frames(self.frame, acceleration.frame())?;
        let (angular, linear) = self.apply(acceleration.angular(), acceleration.linear());
        Ok(Wrench::new(self.frame, angular, linear))
    }

    /// Net wrench required to give a body moving with `twist` the spatial acceleration
    /// `acceleration`: `I a + v x* (I v)`
    pub fn newton_euler(&self, acceleration: &SpatialAcceleration<T>, twist: &Twist<T>) -> Result<Wrench<T>> {
        let inertial = self.wrench(acceleration)?;
        let gyroscopic = self.momentum(twist)?.cross_twist(twist)?;
        inertial.add(&gyroscopic)
    }

    pub fn kinetic_energy(&self, twist: &Twist<T>) -> Result<T> {
        let momentum = self.momentum(twist)?;
        let half: T = crate::scalar::lit(0.5);
        Ok(half * (momentum.angular().dot(twist.angular()) + momentum.linear().dot(twist.linear())))
    }

    /// The 6x6 matrix acting on `[angular; linear]` motion vectors
    pub fn to_matrix(&self) -> Matrix6<T> {
        let mut result = Matrix6::zeros();
        let c_hat = self.cross_part.cross_matrix();
        result.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.moment);
        result.fixed_view_mut::<3, 3>(0, 3).copy_from(&c_hat);
        result.fixed_view_mut::<3, 3>(3, 0).copy_from(&c_hat.transpose());
        result
            .fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&(Matrix3::identity() * self.mass));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Rotation3, Unit, Vector6};

    fn sample(frame: CoordinateFrame) -> SpatialInertia<f64> {
        SpatialInertia::from_com(
            frame,
            2.5,
            Vector3::new(0.1, -0.2, 0.3),
            Matrix3::new(0.4, 0.01, 0.0, 0.01, 0.3, 0.02, 0.0, 0.02, 0.2),
        )
    }

    #[test]
    fn matrix_matches_apply() {
        let frame = CoordinateFrame::new();
        let inertia = sample(frame);
        let (w, v) = (Vector3::new(0.3, -1.0, 2.0), Vector3::new(1.0, 0.5, -0.25));
        let (angular, linear) = inertia.apply(&w, &v);
        let product = inertia.to_matrix() * Vector6::new(w.x, w.y, w.z, v.x, v.y, v.z);
        assert_abs_diff_eq!(product.fixed_rows::<3>(0).into_owned(), angular, epsilon = 1e-12);
        assert_abs_diff_eq!(product.fixed_rows::<3>(3).into_owned(), linear, epsilon = 1e-12);
        assert_abs_diff_eq!(inertia.to_matrix(), inertia.to_matrix().transpose(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            inertia.center_of_mass().coords(),
            &Vector3::new(0.1, -0.2, 0.3),
            epsilon = 1e-12
        );
    }

    #[test]
    fn transform_commutes_with_momentum() {
        let (a, b, body, base) = (
            CoordinateFrame::new(),
            CoordinateFrame::new(),
            CoordinateFrame::new(),
            CoordinateFrame::new(),
        );
        let axis = Unit::new_normalize(Vector3::new(-0.5, 1.0, 0.3));
        let tf = Transform3D::new(
            a,
            b,
            Rotation3::from_axis_angle(&axis, 2.1).into_inner(),
            Vector3::new(1.0, 0.0, -0.7),
        );
        let inertia = sample(a);
        let twist = Twist::new(body, base, a, Vector3::new(0.2, 0.4, -0.1), Vector3::new(-0.3, 1.2, 0.8));

        let expected = inertia.momentum(&twist).unwrap().transform(&tf).unwrap();
        let actual = inertia
            .transform(&tf)
            .unwrap()
            .momentum(&twist.transform(&tf).unwrap())
            .unwrap();
        assert_abs_diff_eq!(actual.angular(), expected.angular(), epsilon = 1e-12);
        assert_abs_diff_eq!(actual.linear(), expected.linear(), epsilon = 1e-12);

        let energy = inertia.kinetic_energy(&twist).unwrap();
        let moved = inertia.transform(&tf).unwrap().kinetic_energy(&twist.transform(&tf).unwrap());
        assert_abs_diff_eq!(energy, moved.unwrap(), epsilon = 1e-12);
        assert!(inertia.transform(&tf.inverse()).is_err());
    }

    #[test]
    fn parallel_axis() {
        let frame = CoordinateFrame::new();
        let point_mass = SpatialInertia::from_com(frame, 2.0, Vector3::new(0.0, 0.0, -1.0), Matrix3::zeros());
        assert_abs_diff_eq!(
            point_mass.moment(),
            &Matrix3::from_diagonal(&Vector3::new(2.0, 2.0, 0.0)),
            epsilon = 1e-12
        );
        let doubled = point_mass.add(&point_mass).unwrap();
        assert_abs_diff_eq!(doubled.mass(), 4.0);
        assert!(point_mass.add(&SpatialInertia::zero(CoordinateFrame::new())).is_err());
    }
}
