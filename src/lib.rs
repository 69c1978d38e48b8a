//! ## About
//!
//! This crate contains the data structures and algorithms for the kinematics and dynamics of
//! rigid-body mechanisms such as robots and articulated characters. A [Mechanism] is a tree of
//! [RigidBody]s connected by [Joint]s (plus optional loop joints) and a [MechanismState] holds
//! the joint configuration and velocity together with a cache of quantities derived from them.
//!
//! All algorithms are generic over the [Scalar] type (e.g., `f64` or `f32`) and check at run time
//! that geometric quantities are combined only when they are expressed in the same
//! [spatial::CoordinateFrame].
//!
//! ```
//! use rigid_dynamics::{dynamics, models, MechanismState};
//!
//! let mechanism = models::double_pendulum::<f64>().unwrap();
//! let mut state = MechanismState::new(&mechanism).unwrap();
//! state.set_configuration(&[0.3, -0.2]).unwrap();
//! let holding_torques = dynamics::inverse_dynamics(&mut state, &[0.0, 0.0], None).unwrap();
//! let vdot = dynamics::forward_dynamics(&mut state, holding_torques.as_slice(), None).unwrap();
//! assert!(vdot.norm() < 1e-9);
//! ```
//!
//! ## Reading list
//!
//! * Featherstone, *Rigid Body Dynamics Algorithms*, Springer 2008: spatial vector notation, CRBA
//!   and RNEA
//! * [A Beginner's Guide to 6-D Vectors](https://royfeatherstone.org/spatial/)
//!
//! ## Naming conventions
//! * Structs – substantives that indicate entities implementing a behavior
//! * Methods – imperative forms with the exception of getters and factories, which
//!             use substantives (i.e., omit a `get_` prefix) much like the standard library.
//! * `_into` suffix – variants of an algorithm that write into preallocated buffers. The
//!                    variants without the suffix allocate their result and delegate.
//! * Spatial vectors – `[angular; linear]` layout, expressed in the root frame by the algorithms

pub mod arena;
#[cfg(feature = "rayon")]
pub mod batch;
pub mod body;
pub mod dynamics;
pub mod errors;
pub mod joint;
pub mod kinematics;
pub mod mechanism;
pub mod models;
pub mod scalar;
pub mod spatial;
pub mod state;

pub use body::{BodyId, RigidBody};
pub use dynamics::{DynamicsResult, NewtonEulerBuffers};
pub use errors::{DynamicsError, EntityKind, Result};
pub use joint::{Joint, JointId, JointType};
pub use mechanism::{InertialDescription, LinkDescription, LoopJoint, Mechanism, TreeNode, TreePath};
pub use scalar::Scalar;
pub use state::{set_maximal_coordinates, CachedQuantity, MechanismState};
