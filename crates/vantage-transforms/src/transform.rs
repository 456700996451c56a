//! Rigid-body transforms between coordinate frames.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

/// A rigid transform: rotate, then translate.
///
/// A frame's transform maps coordinates expressed in that frame into its
/// parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation component.
    pub translation: DVec3,
    /// Rotation component (unit quaternion).
    pub rotation: DQuat,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Creates a transform from translation and rotation.
    #[must_use]
    pub const fn new(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Creates a transform from a pose.
    #[must_use]
    pub const fn from_pose(pose: &Pose) -> Self {
        Self {
            translation: pose.position,
            rotation: pose.orientation,
        }
    }

    /// Composes `self ∘ rhs`: apply `rhs` first, then `self`.
    #[must_use]
    pub fn compose(&self, rhs: &Self) -> Self {
        Self {
            translation: self.translation + self.rotation * rhs.translation,
            rotation: (self.rotation * rhs.rotation).normalize(),
        }
    }

    /// Returns the inverse transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.conjugate();
        Self {
            translation: -(rotation * self.translation),
            rotation,
        }
    }

    /// Applies this transform to a pose, re-expressing it in the target frame.
    #[must_use]
    pub fn apply(&self, pose: &Pose) -> Pose {
        Pose {
            position: self.translation + self.rotation * pose.position,
            orientation: (self.rotation * pose.orientation).normalize(),
        }
    }

    /// Interpolates between `a` and `b` at `fraction` in `[0, 1]`.
    ///
    /// Linear on translation, spherical (shortest arc) on rotation.
    #[must_use]
    pub fn interpolate(a: &Self, b: &Self, fraction: f64) -> Self {
        let t = fraction.clamp(0.0, 1.0);
        Self {
            translation: a.translation.lerp(b.translation, t),
            rotation: a.rotation.slerp(b.rotation, t).normalize(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
