//! Scene extensions for vantage-rs.
//!
//! This crate provides the per-frame coordination layer every visual feature
//! builds on:
//! - [`Renderable`] objects with frame/time metadata and a derived pose
//! - The [`SceneExtension`] trait driving per-frame pose resolution,
//!   settings-tree contributions, and missing-transform error reporting
//! - [`update_pose`], the transform-resolution contract
//! - [`Renderer`], the single-threaded host with its cooperative task queue

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod extension;
pub mod pose_update;
pub mod renderable;
pub mod renderer;

pub use extension::{
    missing_transform_message, update_renderable_poses, ActionContext, ExtensionBase,
    FrameContext, SceneExtension,
};
pub use pose_update::update_pose;
pub use renderable::{BaseSettings, BaseUserData, Renderable, RenderableSet};
pub use renderer::{ColorScheme, Renderer};
