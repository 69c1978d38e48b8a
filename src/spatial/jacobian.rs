//! Frame-annotated 6xN matrices: geometric Jacobians (also used as motion subspaces) and
//! wrench matrices (constraint wrench subspaces).

use super::frame::{check_frames, CoordinateFrame};
use super::motion::Twist;
use super::transform::Transform3D;
use crate::{errors::DynamicsError, errors::Result, Scalar};
use nalgebra::{Matrix3xX, Vector3};

/// Linear map from a velocity vector to the twist of `body` with respect to `base`, expressed in
/// `frame`. Each column is a unit twist in `[angular; linear]` layout.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricJacobian<T: Scalar> {
    body: CoordinateFrame,
    base: CoordinateFrame,
    frame: CoordinateFrame,
    angular: Matrix3xX<T>,
    linear: Matrix3xX<T>,
}

impl<T: Scalar> GeometricJacobian<T> {
    pub fn zeros(body: CoordinateFrame, base: CoordinateFrame, frame: CoordinateFrame, cols: usize) -> Self {
        Self {
            body,
            base,
            frame,
            angular: Matrix3xX::zeros(cols),
            linear: Matrix3xX::zeros(cols),
        }
    }

    pub fn new(
        body: CoordinateFrame,
        base: CoordinateFrame,
        frame: CoordinateFrame,
        angular: Matrix3xX<T>,
        linear: Matrix3xX<T>,
    ) -> Result<Self> {
        DynamicsError::check_dimension(angular.ncols(), linear.ncols())?;
        Ok(Self {
            body,
            base,
            frame,
            angular,
            linear,
        })
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

    pub fn ncols(&self) -> usize {
        self.angular.ncols()
    }

    pub fn angular(&self) -> &Matrix3xX<T> {
        &self.angular
    }

    pub fn linear(&self) -> &Matrix3xX<T> {
        &self.linear
    }

    pub fn column(&self, index: usize) -> (Vector3<T>, Vector3<T>) {
        (
            self.angular.column(index).into_owned(),
            self.linear.column(index).into_owned(),
        )
    }

    pub(crate) fn set_column(&mut self, index: usize, angular: &Vector3<T>, linear: &Vector3<T>) {
        self.angular.set_column(index, angular);
        self.linear.set_column(index, linear);
    }

    pub(crate) fn set_frames(&mut self, body: CoordinateFrame, base: CoordinateFrame, frame: CoordinateFrame) {
        self.body = body;
        self.base = base;
        self.frame = frame;
    }

    pub(crate) fn fill_zero(&mut self) {
        self.angular.fill(T::zero());
        self.linear.fill(T::zero());
    }

    /// The twist resulting from the velocity vector `v`
    pub fn twist(&self, v: &[T]) -> Result<Twist<T>> {
        DynamicsError::check_dimension(self.ncols(), v.len())?;
        let (angular, linear) = v.iter().enumerate().fold(
            (Vector3::zeros(), Vector3::zeros()),
            |(angular, linear), (index, value)| {
                (
                    angular + self.angular.column(index) * *value,
                    linear + self.linear.column(index) * *value,
                )
            },
        );
        Ok(Twist::new(self.body, self.base, self.frame, angular, linear))
    }

    pub fn transform(&self, transform: &Transform3D<T>) -> Result<GeometricJacobian<T>> {
        check_frames(transform.from(), self.frame)?;
        let mut result = self.clone();
        result.frame = transform.to();
        for index in 0..self.ncols() {
            let (w, v) = self.column(index);
            let (w, v) = transform.apply_motion(&w, &v);
            result.set_column(index, &w, &v);
        }
        Ok(result)
    }
}

/// A set of wrenches expressed in `frame`, one per column in `[angular; linear]` layout
#[derive(Debug, Clone, PartialEq)]
pub struct WrenchMatrix<T: Scalar> {
    frame: CoordinateFrame,
    angular: Matrix3xX<T>,
    linear: Matrix3xX<T>,
}

impl<T: Scalar> WrenchMatrix<T> {
    pub fn new(frame: CoordinateFrame, angular: Matrix3xX<T>, linear: Matrix3xX<T>) -> Result<Self> {
        DynamicsError::check_dimension(angular.ncols(), linear.ncols())?;
        Ok(Self { frame, angular, linear })
    }

    pub fn from_columns(frame: CoordinateFrame, columns: &[(Vector3<T>, Vector3<T>)]) -> Self {
        let mut angular = Matrix3xX::zeros(columns.len());
        let mut linear = Matrix3xX::zeros(columns.len());
        for (index, (w, v)) in columns.iter().enumerate() {
            angular.set_column(index, w);
            linear.set_column(index, v);
        }
        Self { frame, angular, linear }
    }

    pub fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    pub fn ncols(&self) -> usize {
        self.angular.ncols()
    }

    pub fn column(&self, index: usize) -> (Vector3<T>, Vector3<T>) {
        (
            self.angular.column(index).into_owned(),
            self.linear.column(index).into_owned(),
        )
    }

    pub fn transform(&self, transform: &Transform3D<T>) -> Result<WrenchMatrix<T>> {
        check_frames(transform.from(), self.frame)?;
        let mut result = self.clone();
        result.frame = transform.to();
        for index in 0..self.ncols() {
            let (t, f) = self.column(index);
            let (t, f) = transform.apply_force(&t, &f);
            result.angular.set_column(index, &t);
            result.linear.set_column(index, &f);
        }
        Ok(result)
    }

    /// Power of the wrench in column `index` along the motion in column `motion_index` of `motion`
    pub(crate) fn power(&self, index: usize, motion: &GeometricJacobian<T>, motion_index: usize) -> Result<T> {
        check_frames(self.frame, motion.frame())?;
        Ok(self.angular.column(index).dot(&motion.angular().column(motion_index))
            + self.linear.column(index).dot(&motion.linear().column(motion_index)))
    }
}
