//! Helpers on raw 3D vectors shared by the spatial types.

use crate::Scalar;
use nalgebra::Vector3;

/// Spatial cross product of two motion vectors `(w1, v1) x (w2, v2)`
#[inline]
pub(crate) fn motion_cross<T: Scalar>(
    w1: &Vector3<T>,
    v1: &Vector3<T>,
    w2: &Vector3<T>,
    v2: &Vector3<T>,
) -> (Vector3<T>, Vector3<T>) {
    (w1.cross(w2), w1.cross(v2) + v1.cross(w2))
}

/// Spatial cross product of a motion vector `(w, v)` with a force vector `(t, f)`
#[inline]
pub(crate) fn force_cross<T: Scalar>(
    w: &Vector3<T>,
    v: &Vector3<T>,
    t: &Vector3<T>,
    f: &Vector3<T>,
) -> (Vector3<T>, Vector3<T>) {
    (w.cross(t) + v.cross(f), w.cross(f))
}

/// Two unit vectors that complete `axis` (assumed normalized) to a right-handed orthonormal basis
pub(crate) fn orthonormal_complement<T: Scalar>(axis: &Vector3<T>) -> (Vector3<T>, Vector3<T>) {
    let helper = if axis.x.abs() < crate::scalar::lit::<T>(0.9) {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let first = axis.cross(&helper).normalize();
    let second = axis.cross(&first);
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn complement_is_orthonormal() {
        for axis in [Vector3::x(), Vector3::y(), Vector3::new(1.0, 2.0, -0.5).normalize()] {
            let (a, b) = orthonormal_complement(&axis);
            assert_abs_diff_eq!(a.norm(), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(b.norm(), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(a.dot(&axis), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(b.dot(&axis), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(a.dot(&b), 0.0, epsilon = 1e-12);
        }
    }
}
