//! vantage-rs: a scene-extension core for robotics 3D visualization.
//!
//! The crate coordinates the per-frame lifecycle of renderable 3D objects
//! against a temporal transform graph: every displayed frame, each
//! registered [`SceneExtension`] resolves its renderables' poses relative to
//! the current render frame through the [`TransformTree`], surfacing
//! missing-transform conditions as sidebar errors instead of failures.
//!
//! ```
//! use vantage::{MarkerScene, Renderer, Time};
//!
//! let mut renderer = Renderer::new();
//! renderer.add_extension(Box::new(MarkerScene::new())).unwrap();
//! renderer.animation_frame(Time::ZERO, "base_link", "map");
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod markers;

pub use markers::{
    MarkerAction, MarkerKind, MarkerMessage, MarkerRenderable, MarkerScene,
    MARKERS_EXTENSION_ID,
};

pub use vantage_core::{
    ErrorKind, LayerErrors, PanelConfig, Result, SettingsAction, SettingsManager, SettingsPath,
    SettingsTreeEntry, SettingsTreeField, SettingsTreeNode, Time, VantageError,
};
pub use vantage_scene::{
    update_pose, ActionContext, BaseSettings, BaseUserData, ColorScheme, ExtensionBase,
    FrameContext, Renderable, RenderableSet, Renderer, SceneExtension,
};
pub use vantage_transforms::{CoordinateFrame, Pose, Transform, TransformTree};

// Re-export glam types for convenience
pub use glam::{DQuat, DVec3};

/// Installs the `env_logger` backend for demos and tests.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().format_timestamp_millis().try_init();
    log::debug!("vantage-rs logging initialized");
}
