//! Position and orientation of an object within one coordinate frame.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// A position and orientation, meaningful only relative to a named frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation component.
    pub position: DVec3,
    /// Rotation component (unit quaternion).
    pub orientation: DQuat,
}

impl Pose {
    /// The identity pose: origin, no rotation.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
    };

    /// Creates a pose from position and orientation.
    #[must_use]
    pub const fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}
