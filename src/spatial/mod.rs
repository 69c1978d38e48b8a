//! Frame-checked spatial algebra: frames, points and vectors, rigid transforms, twists, spatial
//! accelerations, wrenches, momenta, spatial inertias and 6xN spatial matrices.
//!
//! Spatial vectors use the `[angular; linear]` layout of Featherstone's
//! "Rigid Body Dynamics Algorithms". All operations combining two quantities check that they are
//! expressed in the same frame and return [crate::DynamicsError::FrameMismatch] otherwise.

pub mod force;
pub mod frame;
pub mod inertia;
pub mod jacobian;
pub mod motion;
pub mod point;
pub mod transform;
pub(crate) mod util;

pub use force::{Momentum, Wrench};
pub use frame::{check_frames, CoordinateFrame};
pub use inertia::SpatialInertia;
pub use jacobian::{GeometricJacobian, WrenchMatrix};
pub use motion::{SpatialAcceleration, Twist};
pub use point::{FreeVector3D, Point3D};
pub use transform::Transform3D;
