//! Spatial motion vectors: twists (spatial velocities) and spatial accelerations.
//!
//! Both are stored as `[angular; linear]` and annotated with the moving `body` frame, the `base`
//! frame the motion is measured against, and the `frame` the coordinates are expressed in. The
//! linear part is the velocity (acceleration) of the point coinciding with the origin of `frame`.
//! Spatial accelerations follow the spatial (not the conventional) acceleration convention, so
//! they transform exactly like twists.

use super::frame::{check_frames, CoordinateFrame};
use super::point::{FreeVector3D, Point3D};
use super::transform::Transform3D;
use super::util::motion_cross;
use crate::{
    errors::{DynamicsError, Result},
    Scalar,
};
use nalgebra::Vector3;

/// Resolves the body/base annotation of the sum of two chained motion vectors
fn chain(
    (body1, base1): (CoordinateFrame, CoordinateFrame),
    (body2, base2): (CoordinateFrame, CoordinateFrame),
) -> Result<(CoordinateFrame, CoordinateFrame)> {
    if body1 == base2 {
        Ok((body2, base1))
    } else if base1 == body2 {
        Ok((body1, base2))
    } else {
        Err(DynamicsError::FrameMismatch {
            expected: base1,
            actual: body2,
        })
    }
}

/// Spatial velocity of `body` relative to `base`, expressed in `frame`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist<T: Scalar> {
    body: CoordinateFrame,
    base: CoordinateFrame,
    frame: CoordinateFrame,
    angular: Vector3<T>,
    linear: Vector3<T>,
}

impl<T: Scalar> Twist<T> {
    pub fn new(
        body: CoordinateFrame,
        base: CoordinateFrame,
        frame: CoordinateFrame,
        angular: Vector3<T>,
        linear: Vector3<T>,
    ) -> Self {
        Self {
            body,
            base,
            frame,
            angular,
            linear,
        }
    }

    pub fn zero(body: CoordinateFrame, base: CoordinateFrame, frame: CoordinateFrame) -> Self {
        Self::new(body, base, frame, Vector3::zeros(), Vector3::zeros())
    }

    pub fn body(&self) -> CoordinateFrame {
        self.body
    }

    pub fn base(&self) -> CoordinateFrame {
        self.base
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

    /// Same motion, different body/base annotation (for frames rigidly attached to them)
    pub fn with_frames(&self, body: CoordinateFrame, base: CoordinateFrame) -> Self {
        Self { body, base, ..*self }
    }

    /// Sum of two chained twists: `(c wrt b) + (b wrt a) = (c wrt a)` in either operand order.
    pub fn add(&self, other: &Twist<T>) -> Result<Twist<T>> {
        check_frames(self.frame, other.frame)?;
        let (body, base) = chain((self.body, self.base), (other.body, other.base))?;
        Ok(Twist::new(
            body,
            base,
            self.frame,
            self.angular + other.angular,
            self.linear + other.linear,
        ))
    }

    pub fn sub(&self, other: &Twist<T>) -> Result<Twist<T>> {
        self.add(&-*other)
    }

    pub fn transform(&self, transform: &Transform3D<T>) -> Result<Twist<T>> {
        check_frames(transform.from(), self.frame)?;
        let (angular, linear) = transform.apply_motion(&self.angular, &self.linear);
        Ok(Twist::new(self.body, self.base, transform.to(), angular, linear))
    }

    /// Velocity of a point rigidly attached to `body`
    pub fn point_velocity(&self, point: &Point3D<T>) -> Result<FreeVector3D<T>> {
        check_frames(self.frame, point.frame())?;
        Ok(FreeVector3D::new(
            self.frame,
            self.linear + self.angular.cross(point.coords()),
        ))
    }

    /// Spatial cross product `self x other`, the rate of change of `other` when it is carried
    /// along with `self`. Used for velocity-product (bias) accelerations.
    pub fn cross(&self, other: &Twist<T>) -> Result<SpatialAcceleration<T>> {
        check_frames(self.frame, other.frame)?;
        let (angular, linear) = motion_cross(&self.angular, &self.linear, &other.angular, &other.linear);
        Ok(SpatialAcceleration::new(
            other.body,
            other.base,
            self.frame,
            angular,
            linear,
        ))
    }
}

impl<T: Scalar> std::ops::Neg for Twist<T> {
    type Output = Twist<T>;

    /// Motion of `base` relative to `body`
    fn neg(self) -> Self::Output {
        Twist::new(self.base, self.body, self.frame, -self.angular, -self.linear)
    }
}

/// Spatial acceleration of `body` relative to `base`, expressed in `frame`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialAcceleration<T: Scalar> {
    body: CoordinateFrame,
    base: CoordinateFrame,
    frame: CoordinateFrame,
    angular: Vector3<T>,
    linear: Vector3<T>,
}

impl<T: Scalar> SpatialAcceleration<T> {
    pub fn new(
        body: CoordinateFrame,
        base: CoordinateFrame,
        frame: CoordinateFrame,
        angular: Vector3<T>,
        linear: Vector3<T>,
    ) -> Self {
        Self {
            body,
            base,
            frame,
            angular,
            linear,
        }
    }

    pub fn zero(body: CoordinateFrame, base: CoordinateFrame, frame: CoordinateFrame) -> Self {
        Self::new(body, base, frame, Vector3::zeros(), Vector3::zeros())
    }

    pub fn body(&self) -> CoordinateFrame {
        self.body
    }

    pub fn base(&self) -> CoordinateFrame {
        self.base
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

    pub fn with_frames(&self, body: CoordinateFrame, base: CoordinateFrame) -> Self {
        Self { body, base, ..*self }
    }

    pub fn add(&self, other: &SpatialAcceleration<T>) -> Result<SpatialAcceleration<T>> {
        check_frames(self.frame, other.frame)?;
        let (body, base) = chain((self.body, self.base), (other.body, other.base))?;
        Ok(SpatialAcceleration::new(
            body,
            base,
            self.frame,
            self.angular + other.angular,
            self.linear + other.linear,
        ))
    }

    pub fn sub(&self, other: &SpatialAcceleration<T>) -> Result<SpatialAcceleration<T>> {
        self.add(&-*other)
    }

    pub fn transform(&self, transform: &Transform3D<T>) -> Result<SpatialAcceleration<T>> {
        check_frames(transform.from(), self.frame)?;
        let (angular, linear) = transform.apply_motion(&self.angular, &self.linear);
        Ok(SpatialAcceleration::new(self.body, self.base, transform.to(), angular, linear))
    }
}

impl<T: Scalar> std::ops::Neg for SpatialAcceleration<T> {
    type Output = SpatialAcceleration<T>;

    fn neg(self) -> Self::Output {
        SpatialAcceleration::new(self.base, self.body, self.frame, -self.angular, -self.linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Rotation3, Unit};

    #[test]
    fn chained_addition() {
        let (a, b, c, world) = (
            CoordinateFrame::new(),
            CoordinateFrame::new(),
            CoordinateFrame::new(),
            CoordinateFrame::new(),
        );
        let b_wrt_a = Twist::new(b, a, world, Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0));
        let c_wrt_b = Twist::new(c, b, world, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());

        let c_wrt_a = b_wrt_a.add(&c_wrt_b).unwrap();
        assert_eq!((c_wrt_a.body(), c_wrt_a.base()), (c, a));
        assert_eq!(c_wrt_b.add(&b_wrt_a).unwrap(), c_wrt_a);

        // c wrt a minus b wrt a is c wrt b
        let back = c_wrt_a.sub(&b_wrt_a).unwrap();
        assert_eq!((back.body(), back.base()), (c, b));
        assert_abs_diff_eq!(back.angular(), c_wrt_b.angular(), epsilon = 1e-12);

        // unrelated twists cannot be added
        let unrelated = Twist::<f64>::zero(c, a, world);
        assert!(b_wrt_a.add(&unrelated).is_err());
        // nor can twists in different frames
        assert!(b_wrt_a.add(&Twist::zero(c, b, a)).is_err());
    }

    #[test]
    fn transform_preserves_point_velocities() {
        let (body, base, a, b) = (
            CoordinateFrame::new(),
            CoordinateFrame::new(),
            CoordinateFrame::new(),
            CoordinateFrame::new(),
        );
        let axis = Unit::new_normalize(Vector3::new(1.0, 1.0, 0.0));
        let tf = Transform3D::new(
            a,
            b,
            Rotation3::from_axis_angle(&axis, 0.4).into_inner(),
            Vector3::new(0.5, -1.0, 2.0),
        );
        let twist = Twist::new(body, base, a, Vector3::new(0.1, -0.3, 0.8), Vector3::new(1.0, 2.0, 3.0));
        let point = Point3D::new(a, Vector3::new(-0.4, 0.2, 0.9));

        let in_a = twist.point_velocity(&point).unwrap();
        let in_b = twist
            .transform(&tf)
            .unwrap()
            .point_velocity(&tf.transform_point(&point).unwrap())
            .unwrap();
        let expected = tf.transform_vector(&in_a).unwrap();
        assert_abs_diff_eq!(in_b.coords(), expected.coords(), epsilon = 1e-12);
        assert!(twist.transform(&tf.inverse()).is_err());
    }
}
