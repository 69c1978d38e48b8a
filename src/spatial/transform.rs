//! Rigid transforms between two frames.

use super::frame::{check_frames, CoordinateFrame};
use super::point::{FreeVector3D, Point3D};
use crate::{errors::Result, Scalar};
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

/// Rigid transform mapping coordinates expressed in `from` to coordinates expressed in `to`:
/// `p_to = rot * p_from + trans`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D<T: Scalar> {
    from: CoordinateFrame,
    to: CoordinateFrame,
    rot: Matrix3<T>,
    trans: Vector3<T>,
}

impl<T: Scalar> Transform3D<T> {
    pub fn new(from: CoordinateFrame, to: CoordinateFrame, rot: Matrix3<T>, trans: Vector3<T>) -> Self {
        Self { from, to, rot, trans }
    }

    /// The identity transform of a frame onto itself
    pub fn identity(frame: CoordinateFrame) -> Self {
        Self::identity_between(frame, frame)
    }

    /// Identity transform between two coincident frames
    pub fn identity_between(from: CoordinateFrame, to: CoordinateFrame) -> Self {
        Self::new(from, to, Matrix3::identity(), Vector3::zeros())
    }

    pub fn from_rotation(from: CoordinateFrame, to: CoordinateFrame, rot: &Rotation3<T>) -> Self {
        Self::new(from, to, *rot.matrix(), Vector3::zeros())
    }

    pub fn from_translation(from: CoordinateFrame, to: CoordinateFrame, trans: Vector3<T>) -> Self {
        Self::new(from, to, Matrix3::identity(), trans)
    }

    pub fn from_quaternion(
        from: CoordinateFrame,
        to: CoordinateFrame,
        rot: &UnitQuaternion<T>,
        trans: Vector3<T>,
    ) -> Self {
        Self::new(from, to, rot.to_rotation_matrix().into_inner(), trans)
    }

    pub fn from(&self) -> CoordinateFrame {
        self.from
    }

    pub fn to(&self) -> CoordinateFrame {
        self.to
    }

    pub fn rotation(&self) -> &Matrix3<T> {
        &self.rot
    }

    pub fn translation(&self) -> &Vector3<T> {
        &self.trans
    }

    /// Chains `self` (`b -> c`) after `first` (`a -> b`) into `a -> c`
    pub fn compose(&self, first: &Transform3D<T>) -> Result<Transform3D<T>> {
        check_frames(self.from, first.to)?;
        Ok(Transform3D::new(
            first.from,
            self.to,
            self.rot * first.rot,
            self.rot * first.trans + self.trans,
        ))
    }

    pub fn inverse(&self) -> Transform3D<T> {
        let rot_t = self.rot.transpose();
        Transform3D::new(self.to, self.from, rot_t, -(rot_t * self.trans))
    }

    pub fn transform_point(&self, point: &Point3D<T>) -> Result<Point3D<T>> {
        check_frames(self.from, point.frame())?;
        Ok(Point3D::new(self.to, self.rot * point.coords() + self.trans))
    }

    pub fn transform_vector(&self, vector: &FreeVector3D<T>) -> Result<FreeVector3D<T>> {
        check_frames(self.from, vector.frame())?;
        Ok(FreeVector3D::new(self.to, self.rot * vector.coords()))
    }

    /// Applies the rotation and translation to raw coordinates of a motion vector `(w, v)`
    #[inline]
    pub(crate) fn apply_motion(&self, w: &Vector3<T>, v: &Vector3<T>) -> (Vector3<T>, Vector3<T>) {
        let w = self.rot * w;
        let v = self.rot * v + self.trans.cross(&w);
        (w, v)
    }

    /// Applies the rotation and translation to raw coordinates of a force vector `(t, f)`
    #[inline]
    pub(crate) fn apply_force(&self, t: &Vector3<T>, f: &Vector3<T>) -> (Vector3<T>, Vector3<T>) {
        let f = self.rot * f;
        let t = self.rot * t + self.trans.cross(&f);
        (t, f)
    }

    /// Same frames and all entries within `epsilon`
    pub fn is_approx(&self, other: &Transform3D<T>, epsilon: T) -> bool {
        self.from == other.from
            && self.to == other.to
            && (self.rot - other.rot).amax() <= epsilon
            && (self.trans - other.trans).amax() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Unit;

    fn sample(from: CoordinateFrame, to: CoordinateFrame) -> Transform3D<f64> {
        let axis = Unit::new_normalize(Vector3::new(0.3, -1.0, 0.2));
        Transform3D::new(
            from,
            to,
            Rotation3::from_axis_angle(&axis, 0.7).into_inner(),
            Vector3::new(1.0, -2.0, 0.5),
        )
    }

    #[test]
    fn compose_and_invert() {
        let (a, b, c) = (CoordinateFrame::new(), CoordinateFrame::new(), CoordinateFrame::new());
        let ab = sample(a, b);
        let bc = sample(b, c);
        let ac = bc.compose(&ab).unwrap();
        assert_eq!((ac.from(), ac.to()), (a, c));

        let p = Point3D::new(a, Vector3::new(0.1, 0.2, 0.3));
        let direct = ac.transform_point(&p).unwrap();
        let chained = bc.transform_point(&ab.transform_point(&p).unwrap()).unwrap();
        assert_abs_diff_eq!(direct.coords(), chained.coords(), epsilon = 1e-12);

        let identity = ab.inverse().compose(&ab).unwrap();
        assert!(identity.is_approx(&Transform3D::identity(a), 1e-12));
    }

    #[test]
    fn frame_checks() {
        let (a, b) = (CoordinateFrame::new(), CoordinateFrame::new());
        let ab = sample(a, b);
        assert!(ab.compose(&ab).is_err());
        assert!(ab.transform_point(&Point3D::origin(b)).is_err());
        assert!(ab.transform_vector(&FreeVector3D::zero(a)).is_ok());
    }
}
