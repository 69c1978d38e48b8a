//! Provides the error type used throughout this crate.

use crate::spatial::CoordinateFrame;
use std::fmt;
use thiserror::Error;

/// Kind of entity that could not be found in a [crate::Mechanism]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Body,
    Joint,
    Frame,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Body => write!(f, "body"),
            EntityKind::Joint => write!(f, "joint"),
            EntityKind::Frame => write!(f, "frame"),
        }
    }
}

/// The error type of this crate. All errors are deterministic: retrying
/// with the same input yields the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DynamicsError {
    /// Geometric operands expressed in incompatible frames
    #[error("Frame mismatch: expected {expected}, got {actual}")]
    FrameMismatch {
        expected: CoordinateFrame,
        actual: CoordinateFrame,
    },
    /// Body, joint or frame is not part of the queried mechanism
    #[error("Unknown {kind}: {name}")]
    UnknownEntity { kind: EntityKind, name: String },
    /// An edit would leave the body/joint graph in an invalid state
    #[error("Topology violation: {0}")]
    TopologyViolation(String),
    #[error("Wrong dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// The mass matrix could not be factorized (zero or negative mass/inertia), or a joint axis
    /// or orientation quaternion is degenerate
    #[error("Singular system: {0}")]
    SingularSystem(String),
}

impl DynamicsError {
    pub(crate) fn unknown(kind: EntityKind, name: impl fmt::Display) -> Self {
        DynamicsError::UnknownEntity {
            kind,
            name: name.to_string(),
        }
    }

    pub(crate) fn check_dimension(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(DynamicsError::DimensionMismatch { expected, actual })
        }
    }
}

/// Shortcut used by all fallible operations of this crate
pub type Result<T> = std::result::Result<T, DynamicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let error = DynamicsError::unknown(EntityKind::Joint, "elbow");
        assert_eq!(error.to_string(), "Unknown joint: elbow");

        let error = DynamicsError::check_dimension(3, 2).unwrap_err();
        assert_eq!(error.to_string(), "Wrong dimensions: expected 3, got 2");
        assert!(DynamicsError::check_dimension(4, 4).is_ok());
    }
}
