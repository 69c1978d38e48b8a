//! Rigid bodies: a default frame, an optional spatial inertia and any number of frames rigidly
//! attached to the body.

use crate::{
    errors::{DynamicsError, EntityKind, Result},
    scalar::lit,
    spatial::{check_frames, CoordinateFrame, SpatialInertia, Transform3D},
    Scalar,
};
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_BODY_ID: AtomicU64 = AtomicU64::new(0);

/// Globally unique identifier of a [RigidBody]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

impl BodyId {
    fn next() -> Self {
        BodyId(NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct RigidBody<T: Scalar> {
    id: BodyId,
    name: String,
    frame: CoordinateFrame,
    inertia: Option<SpatialInertia<T>>,
    /// Transforms from attached frames to the default frame
    frame_definitions: Vec<Transform3D<T>>,
}

impl<T: Scalar> RigidBody<T> {
    /// A body whose default frame is the frame its inertia is expressed in
    pub fn new(name: impl Into<String>, inertia: SpatialInertia<T>) -> Self {
        Self::with_frame(name, inertia.frame(), Some(inertia))
    }

    /// A body without inertia (e.g., the world)
    pub fn massless(name: impl Into<String>) -> Self {
        Self::with_frame(name, CoordinateFrame::new(), None)
    }

    fn with_frame(name: impl Into<String>, frame: CoordinateFrame, inertia: Option<SpatialInertia<T>>) -> Self {
        RigidBody {
            id: BodyId::next(),
            name: name.into(),
            frame,
            inertia,
            frame_definitions: vec![Transform3D::identity(frame)],
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_frame(&self) -> CoordinateFrame {
        self.frame
    }

    pub fn inertia(&self) -> Option<&SpatialInertia<T>> {
        self.inertia.as_ref()
    }

    pub fn has_inertia(&self) -> bool {
        self.inertia.is_some()
    }

    /// Replaces the inertia. It must be expressed in the default frame.
    pub fn set_inertia(&mut self, inertia: Option<SpatialInertia<T>>) -> Result<()> {
        if let Some(inertia) = &inertia {
            check_frames(self.frame, inertia.frame())?;
        }
        self.inertia = inertia;
        Ok(())
    }

    pub fn frame_definitions(&self) -> &[Transform3D<T>] {
        &self.frame_definitions
    }

    pub fn is_attached(&self, frame: CoordinateFrame) -> bool {
        self.frame_definitions.iter().any(|def| def.from() == frame)
    }

    /// The transform from `frame` to the default frame
    pub fn frame_definition(&self, frame: CoordinateFrame) -> Result<&Transform3D<T>> {
        self.frame_definitions
            .iter()
            .find(|def| def.from() == frame)
            .ok_or_else(|| DynamicsError::unknown(EntityKind::Frame, frame))
    }

    /// The definition (transform to the default frame) that `transform` gives its `from` frame.
    /// A frame that is already attached keeps its pose: any other pose is a
    /// [DynamicsError::TopologyViolation].
    pub fn resolve_frame(&self, transform: &Transform3D<T>) -> Result<Transform3D<T>> {
        let to_default = self.frame_definition(transform.to())?.compose(transform)?;
        if let Ok(existing) = self.frame_definition(transform.from()) {
            if !existing.is_approx(&to_default, lit::<T>(1e-6)) {
                return Err(DynamicsError::TopologyViolation(format!(
                    "frame {} of {self} is already attached with a different pose",
                    transform.from()
                )));
            }
        }
        Ok(to_default)
    }

    /// Rigidly attaches a new frame. The transform must map the new frame to any frame already
    /// attached to the body. Re-attaching a frame with its current pose does nothing.
    pub fn add_frame(&mut self, transform: Transform3D<T>) -> Result<()> {
        let to_default = self.resolve_frame(&transform)?;
        if !self.is_attached(to_default.from()) {
            self.frame_definitions.push(to_default);
        }
        Ok(())
    }

    /// Moves the frame definitions and inertia of `other` into this body. `to_self` maps the
    /// default frame of `other` to the default frame of this body.
    pub(crate) fn merge(&mut self, other: &RigidBody<T>, to_self: &Transform3D<T>) -> Result<()> {
        check_frames(self.frame, to_self.to())?;
        check_frames(other.frame, to_self.from())?;
        for def in other.frame_definitions.iter() {
            let to_default = to_self.compose(def)?;
            if !self.is_attached(def.from()) {
                self.frame_definitions.push(to_default);
            }
        }
        if let Some(inertia) = &other.inertia {
            let inertia = inertia.transform(to_self)?;
            self.inertia = Some(match &self.inertia {
                Some(own) => own.add(&inertia)?,
                None => inertia,
            });
        }
        Ok(())
    }
}

impl<T: Scalar> fmt::Display for RigidBody<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix3, Vector3};

    #[test]
    fn attached_frames() {
        let mut body = RigidBody::<f64>::massless("link");
        let a = CoordinateFrame::new();
        let b = CoordinateFrame::new();
        body.add_frame(Transform3D::from_translation(a, body.default_frame(), Vector3::x()))
            .unwrap();
        body.add_frame(Transform3D::from_translation(b, a, Vector3::y())).unwrap();
        let def = body.frame_definition(b).unwrap();
        assert_eq!(def.to(), body.default_frame());
        assert_abs_diff_eq!(*def.translation(), Vector3::new(1.0, 1.0, 0.0));

        let unknown = CoordinateFrame::new();
        assert!(matches!(
            body.add_frame(Transform3D::identity_between(CoordinateFrame::new(), unknown)),
            Err(DynamicsError::UnknownEntity { kind: EntityKind::Frame, .. })
        ));
    }

    #[test]
    fn attached_frames_keep_their_pose() {
        let mut body = RigidBody::<f64>::massless("link");
        let default = body.default_frame();
        let a = CoordinateFrame::new();
        body.add_frame(Transform3D::from_translation(a, default, Vector3::x()))
            .unwrap();
        body.add_frame(Transform3D::from_translation(a, default, Vector3::x()))
            .unwrap();
        assert_eq!(body.frame_definitions().len(), 2);

        assert!(matches!(
            body.add_frame(Transform3D::from_translation(a, default, Vector3::y())),
            Err(DynamicsError::TopologyViolation(_))
        ));
        assert!(matches!(
            body.add_frame(Transform3D::from_translation(default, a, Vector3::z())),
            Err(DynamicsError::TopologyViolation(_))
        ));
        assert_abs_diff_eq!(*body.frame_definition(a).unwrap().translation(), Vector3::x());
        assert!(body
            .frame_definition(default)
            .unwrap()
            .is_approx(&Transform3D::identity(default), 0.0));
    }

    #[test]
    fn inertia_must_match_default_frame() {
        let frame = CoordinateFrame::new();
        let inertia = SpatialInertia::from_com(frame, 1.0, Vector3::zeros(), Matrix3::identity());
        let mut body = RigidBody::new("link", inertia);
        assert_eq!(body.default_frame(), frame);
        assert!(body.has_inertia());
        assert!(!RigidBody::<f64>::massless("world").has_inertia());
        let other = SpatialInertia::zero(CoordinateFrame::new());
        assert!(matches!(
            body.set_inertia(Some(other)),
            Err(DynamicsError::FrameMismatch { .. })
        ));
    }

    #[test]
    fn merge_adds_mass() {
        let mut parent = RigidBody::new(
            "parent",
            SpatialInertia::from_com(CoordinateFrame::new(), 1.0, Vector3::zeros(), Matrix3::identity()),
        );
        let child = RigidBody::new(
            "child",
            SpatialInertia::from_com(CoordinateFrame::new(), 2.0, Vector3::zeros(), Matrix3::identity()),
        );
        let to_parent =
            Transform3D::from_translation(child.default_frame(), parent.default_frame(), Vector3::z());
        parent.merge(&child, &to_parent).unwrap();
        let inertia = parent.inertia().unwrap();
        assert_abs_diff_eq!(inertia.mass(), 3.0);
        assert_abs_diff_eq!(inertia.center_of_mass().coords().z, 2.0 / 3.0, epsilon = 1e-12);
        assert!(parent.is_attached(child.default_frame()));
    }
}
