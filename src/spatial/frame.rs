//! Identity tags for reference frames.

use crate::errors::{DynamicsError, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque tag for a coordinate frame. Two frames are equal only if one was copied from the other.
///
/// Every geometric quantity carries the frame it is expressed in, and operations check these
/// tags at runtime instead of silently mixing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateFrame(u64);

impl CoordinateFrame {
    /// Creates a new, globally unique frame
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        CoordinateFrame(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CoordinateFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Fails with [DynamicsError::FrameMismatch] unless both frames are the same
#[inline]
pub fn check_frames(expected: CoordinateFrame, actual: CoordinateFrame) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DynamicsError::FrameMismatch { expected, actual })
    }
}
