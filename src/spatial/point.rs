//! Frame-annotated points and free vectors.
//!
//! Only the physically meaningful combinations exist:
//! `FreeVector3D + FreeVector3D`, `Point3D + FreeVector3D`, `Point3D - FreeVector3D` and
//! `Point3D - Point3D`. Adding two points does not compile; mixing frames fails with
//! [crate::DynamicsError::FrameMismatch].

use super::frame::{check_frames, CoordinateFrame};
use crate::{errors::Result, Scalar};
use nalgebra::Vector3;

/// A location expressed in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D<T: Scalar> {
    frame: CoordinateFrame,
    v: Vector3<T>,
}

/// A direction or displacement, not bound to a location, expressed in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeVector3D<T: Scalar> {
    frame: CoordinateFrame,
    v: Vector3<T>,
}

impl<T: Scalar> Point3D<T> {
    pub fn new(frame: CoordinateFrame, v: Vector3<T>) -> Self {
        Self { frame, v }
    }

    /// The origin of `frame`
    pub fn origin(frame: CoordinateFrame) -> Self {
        Self::new(frame, Vector3::zeros())
    }

    pub fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    pub fn coords(&self) -> &Vector3<T> {
        &self.v
    }

    /// `Point + FreeVector -> Point`
    pub fn add_vector(&self, other: &FreeVector3D<T>) -> Result<Point3D<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(Point3D::new(self.frame, self.v + other.v))
    }

    /// `Point - FreeVector -> Point`
    pub fn sub_vector(&self, other: &FreeVector3D<T>) -> Result<Point3D<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(Point3D::new(self.frame, self.v - other.v))
    }

    /// `Point - Point -> FreeVector`, the displacement from `other` to `self`
    pub fn sub(&self, other: &Point3D<T>) -> Result<FreeVector3D<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(FreeVector3D::new(self.frame, self.v - other.v))
    }
}

impl<T: Scalar> FreeVector3D<T> {
    pub fn new(frame: CoordinateFrame, v: Vector3<T>) -> Self {
        Self { frame, v }
    }

    pub fn zero(frame: CoordinateFrame) -> Self {
        Self::new(frame, Vector3::zeros())
    }

    pub fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    pub fn coords(&self) -> &Vector3<T> {
        &self.v
    }

    pub fn add(&self, other: &FreeVector3D<T>) -> Result<FreeVector3D<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(FreeVector3D::new(self.frame, self.v + other.v))
    }

    pub fn sub(&self, other: &FreeVector3D<T>) -> Result<FreeVector3D<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(FreeVector3D::new(self.frame, self.v - other.v))
    }

    pub fn dot(&self, other: &FreeVector3D<T>) -> Result<T> {
        check_frames(self.frame, other.frame)?;
        Ok(self.v.dot(&other.v))
    }

    pub fn cross(&self, other: &FreeVector3D<T>) -> Result<FreeVector3D<T>> {
        check_frames(self.frame, other.frame)?;
        Ok(FreeVector3D::new(self.frame, self.v.cross(&other.v)))
    }

    pub fn scale(&self, factor: T) -> FreeVector3D<T> {
        FreeVector3D::new(self.frame, self.v * factor)
    }

    pub fn norm(&self) -> T {
        self.v.norm()
    }
}

impl<T: Scalar> std::ops::Neg for FreeVector3D<T> {
    type Output = FreeVector3D<T>;

    fn neg(self) -> Self::Output {
        FreeVector3D::new(self.frame, -self.v)
    }
}
