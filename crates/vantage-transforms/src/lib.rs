//! Transform resolution for vantage-rs.
//!
//! This crate provides the temporal transform graph every renderable's pose
//! is resolved against:
//! - [`Pose`] and [`Transform`] rigid-body math (f64, via glam)
//! - [`CoordinateFrame`], a time-indexed history of offsets to a parent frame
//! - [`TransformTree`], a forest of frames answering "transform A to B at
//!   time T" queries routed through a fixed frame

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod frame;
pub mod pose;
pub mod transform;
pub mod tree;

pub use frame::CoordinateFrame;
pub use pose::Pose;
pub use transform::Transform;
pub use tree::TransformTree;

// Re-export glam types for convenience
pub use glam::{DQuat, DVec3};
