//! The `SceneExtension` trait: the base abstraction every visual feature
//! specializes.
//!
//! An extension owns a keyed set of renderables, drives their per-frame pose
//! resolution, and bridges them to the settings tree and error table. The
//! default method bodies provide the base behavior; implementors embed an
//! [`ExtensionBase`] and expose it through `base()`/`base_mut()`.

use serde_json::Value;
use vantage_core::layer_errors::{ErrorKind, LayerErrors};
use vantage_core::settings::{SettingsAction, SettingsManager, SettingsPath, SettingsTreeEntry};
use vantage_core::{PanelConfig, Time};
use vantage_transforms::TransformTree;

use crate::pose_update::update_pose;
use crate::renderable::RenderableSet;
use crate::renderer::ColorScheme;

/// Shared state every scene extension carries.
pub struct ExtensionBase {
    extension_id: String,
    renderables: RenderableSet,
}

impl ExtensionBase {
    /// Creates the base state for an extension.
    pub fn new(extension_id: impl Into<String>) -> Self {
        Self {
            extension_id: extension_id.into(),
            renderables: RenderableSet::new(),
        }
    }

    /// Returns the extension identifier.
    #[must_use]
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// Returns the renderable set.
    #[must_use]
    pub fn renderables(&self) -> &RenderableSet {
        &self.renderables
    }

    /// Returns the mutable renderable set.
    pub fn renderables_mut(&mut self) -> &mut RenderableSet {
        &mut self.renderables
    }

    /// Disposes and detaches every renderable. This is the base teardown
    /// behavior; overrides of [`SceneExtension::dispose`] must still reach
    /// it.
    pub fn dispose_renderables(&mut self) {
        self.renderables.clear();
    }
}

/// What an extension sees during `start_frame`.
pub struct FrameContext<'a> {
    /// The transform graph, read-only for the duration of the frame.
    pub transform_tree: &'a TransformTree,
    /// The per-renderable error table.
    pub errors: &'a mut LayerErrors,
}

/// What an extension sees while handling a settings action.
pub struct ActionContext<'a> {
    /// The persisted panel configuration.
    pub config: &'a mut PanelConfig,
    /// The settings sink, for refreshing tree contributions.
    pub settings: &'a mut SettingsManager,
}

/// A visual feature plugged into the host renderer.
pub trait SceneExtension: std::any::Any + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Returns the shared extension state.
    fn base(&self) -> &ExtensionBase;

    /// Returns the mutable shared extension state.
    fn base_mut(&mut self) -> &mut ExtensionBase;

    /// Returns the extension identifier.
    fn extension_id(&self) -> &str {
        self.base().extension_id()
    }

    /// Returns the settings-tree nodes this extension contributes.
    ///
    /// Pure; safe to call at any time after construction.
    fn settings_nodes(&self) -> Vec<SettingsTreeEntry> {
        Vec::new()
    }

    /// Handles an edit performed on this extension's settings nodes.
    fn handle_settings_action(&mut self, _ctx: &mut ActionContext<'_>, _action: &SettingsAction) {}

    /// Reacts to a visual theme change.
    fn set_color_scheme(&mut self, _scheme: ColorScheme, _background_color: Option<[f64; 4]>) {}

    /// Pushes the current `settings_nodes()` output into the settings sink
    /// under this extension's identifier.
    ///
    /// Call whenever the node set may have changed.
    fn update_settings_tree(&self, settings: &mut SettingsManager) {
        settings.set_nodes_for_key(self.extension_id().to_string(), self.settings_nodes());
    }

    /// Persists `value` into the panel configuration at `path`, then
    /// refreshes the settings tree. `None` deletes the key, leaving it
    /// absent rather than null.
    ///
    /// The config write happens before the tree refresh so the refreshed
    /// tree reflects the new value.
    fn save_setting(&mut self, ctx: &mut ActionContext<'_>, path: &SettingsPath, value: Option<Value>) {
        let result = match value {
            Some(value) => ctx.config.set_at_path(path, value),
            None => ctx.config.delete_at_path(path),
        };
        if let Err(err) = result {
            log::error!("failed to save setting at '{path}': {err}");
            return;
        }
        self.update_settings_tree(ctx.settings);
    }

    /// Disposes and detaches every renderable without releasing the
    /// extension itself, then refreshes the settings tree. Used on seek and
    /// when a new data source loads.
    ///
    /// Errors reported at the removed renderables' settings paths are
    /// cleared with them; nothing is left to retry resolution, so a
    /// surviving entry would never go away.
    fn remove_all_renderables(&mut self, ctx: &mut ActionContext<'_>) {
        let paths: Vec<SettingsPath> = self
            .base()
            .renderables()
            .values()
            .map(|r| r.user_data().settings_path.clone())
            .collect();
        for path in &paths {
            ctx.settings.errors_mut().clear_path(path);
        }
        self.base_mut().dispose_renderables();
        self.update_settings_tree(ctx.settings);
    }

    /// Tears the extension down, disposing every renderable and detaching
    /// all children. Overrides must call
    /// `self.base_mut().dispose_renderables()` to preserve the base
    /// behavior.
    fn dispose(&mut self) {
        self.base_mut().dispose_renderables();
    }

    /// Per-frame update: resolves visibility and pose for every renderable,
    /// reporting or clearing missing-transform errors.
    fn start_frame(
        &mut self,
        ctx: &mut FrameContext<'_>,
        current_time: Time,
        render_frame_id: &str,
        fixed_frame_id: &str,
    ) {
        update_renderable_poses(
            self.base_mut(),
            ctx,
            current_time,
            render_frame_id,
            fixed_frame_id,
        );
    }
}

/// The default `start_frame` body, separated so overrides can run their own
/// pass and still invoke the base behavior.
///
/// Per renderable: an invisible renderable clears its missing-transform
/// error and is skipped. A visible one resolves its pose at `current_time`
/// when frame-locked (the default) or at its own message time otherwise;
/// failure degrades to keeping the last pose and reporting a
/// missing-transform error at the renderable's settings path.
///
/// Renderables are processed in attachment order, so when several share a
/// settings path the latest-attached one decides the error state.
pub fn update_renderable_poses(
    base: &mut ExtensionBase,
    ctx: &mut FrameContext<'_>,
    current_time: Time,
    render_frame_id: &str,
    fixed_frame_id: &str,
) {
    let keys: Vec<String> = base.renderables().children().to_vec();
    for key in &keys {
        let Some(renderable) = base.renderables_mut().get_mut(key) else {
            continue;
        };
        let user_data = renderable.user_data();
        let path = user_data.settings_path.clone();

        if !user_data.settings.visible {
            ctx.errors.remove(&path, ErrorKind::MissingTransform);
            continue;
        }

        let frame_locked = user_data.settings.frame_locked.unwrap_or(true);
        let src_time = if frame_locked {
            current_time
        } else {
            user_data.message_time
        };
        let frame_id = user_data.frame_id.clone();

        let updated = update_pose(
            renderable.as_mut(),
            ctx.transform_tree,
            render_frame_id,
            fixed_frame_id,
            &frame_id,
            current_time,
            src_time,
        );
        if updated {
            ctx.errors.remove(&path, ErrorKind::MissingTransform);
        } else {
            let message = missing_transform_message(render_frame_id, fixed_frame_id, &frame_id);
            ctx.errors.add(path, ErrorKind::MissingTransform, message);
        }
    }
}

/// The user-visible message for an unresolvable transform chain, naming the
/// renderable frame, render frame, and fixed frame.
#[must_use]
pub fn missing_transform_message(
    render_frame_id: &str,
    fixed_frame_id: &str,
    frame_id: &str,
) -> String {
    format!(
        "missing transform from frame \"{frame_id}\" to render frame \"{render_frame_id}\" \
         (fixed frame \"{fixed_frame_id}\")"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderable::{BaseUserData, Renderable};
    use std::any::Any;
    use vantage_transforms::{DQuat, DVec3, Pose, Transform};

    struct Dot {
        name: String,
        user_data: BaseUserData,
    }

    impl Dot {
        fn boxed(name: &str, frame_id: &str, message_time: Time) -> Box<dyn Renderable> {
            Box::new(Self {
                name: name.to_string(),
                user_data: BaseUserData::new(
                    frame_id,
                    message_time,
                    SettingsPath::new(["dots", name]),
                ),
            })
        }
    }

    impl Renderable for Dot {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn user_data(&self) -> &BaseUserData {
            &self.user_data
        }
        fn user_data_mut(&mut self) -> &mut BaseUserData {
            &mut self.user_data
        }
    }

    struct Dots {
        base: ExtensionBase,
    }

    impl SceneExtension for Dots {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn base(&self) -> &ExtensionBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ExtensionBase {
            &mut self.base
        }
    }

    fn setup() -> (Dots, TransformTree, LayerErrors) {
        let mut ext = Dots {
            base: ExtensionBase::new("dots"),
        };
        ext.base_mut()
            .renderables_mut()
            .insert("r", Dot::boxed("r", "lidar", Time::from_nanos(1000)));

        let tree = TransformTree::new();
        (ext, tree, LayerErrors::new())
    }

    fn link(tree: &mut TransformTree, parent: &str, child: &str, nanos: u64, x: f64) {
        tree.add_transform(
            parent,
            child,
            Time::from_nanos(nanos),
            Transform::new(DVec3::new(x, 0.0, 0.0), DQuat::IDENTITY),
        );
    }

    #[test]
    fn test_missing_transform_reports_and_keeps_pose() {
        let (mut ext, tree, mut errors) = setup();
        let path = SettingsPath::new(["dots", "r"]);

        let mut ctx = FrameContext {
            transform_tree: &tree,
            errors: &mut errors,
        };
        ext.start_frame(&mut ctx, Time::from_nanos(1000), "base_link", "map");

        assert!(errors.has_error(&path, ErrorKind::MissingTransform));
        let message = errors
            .error_message(&path, ErrorKind::MissingTransform)
            .unwrap();
        assert!(message.contains("lidar"));
        assert!(message.contains("base_link"));
        assert!(message.contains("map"));

        let pose = ext.base().renderables().get("r").unwrap().render_pose();
        assert_eq!(pose, Pose::IDENTITY);
    }

    #[test]
    fn test_successful_resolve_clears_error() {
        let (mut ext, mut tree, mut errors) = setup();
        let path = SettingsPath::new(["dots", "r"]);

        let mut ctx = FrameContext {
            transform_tree: &tree,
            errors: &mut errors,
        };
        ext.start_frame(&mut ctx, Time::from_nanos(1000), "base_link", "map");
        assert!(errors.has_error(&path, ErrorKind::MissingTransform));

        link(&mut tree, "map", "base_link", 2000, 0.0);
        link(&mut tree, "base_link", "lidar", 2000, 3.0);

        let mut ctx = FrameContext {
            transform_tree: &tree,
            errors: &mut errors,
        };
        ext.start_frame(&mut ctx, Time::from_nanos(2000), "base_link", "map");

        assert!(!errors.has_error(&path, ErrorKind::MissingTransform));
        let pose = ext.base().renderables().get("r").unwrap().render_pose();
        assert!((pose.position.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_invisible_skips_and_clears() {
        let (mut ext, tree, mut errors) = setup();
        let path = SettingsPath::new(["dots", "r"]);
        errors.add(path.clone(), ErrorKind::MissingTransform, "stale");

        ext.base_mut()
            .renderables_mut()
            .get_mut("r")
            .unwrap()
            .user_data_mut()
            .settings
            .visible = false;

        let mut ctx = FrameContext {
            transform_tree: &tree,
            errors: &mut errors,
        };
        // The tree has no frames at all; an invisible renderable must not
        // query it, so this cannot produce a new error.
        ext.start_frame(&mut ctx, Time::from_nanos(1000), "base_link", "map");
        assert!(!errors.has_error(&path, ErrorKind::MissingTransform));
    }

    #[test]
    fn test_frame_locked_selects_source_time() {
        let (mut ext, mut tree, mut errors) = setup();
        // base_link moves between the message time and current time
        link(&mut tree, "map", "lidar", 1000, 10.0);
        link(&mut tree, "map", "lidar", 5000, 50.0);

        // frame_locked unset: resolve at current time
        let mut ctx = FrameContext {
            transform_tree: &tree,
            errors: &mut errors,
        };
        ext.start_frame(&mut ctx, Time::from_nanos(5000), "map", "map");
        let pose = ext.base().renderables().get("r").unwrap().render_pose();
        assert!((pose.position.x - 50.0).abs() < 1e-9);

        // frame_locked=false: pin to the message time
        ext.base_mut()
            .renderables_mut()
            .get_mut("r")
            .unwrap()
            .user_data_mut()
            .settings
            .frame_locked = Some(false);
        let mut ctx = FrameContext {
            transform_tree: &tree,
            errors: &mut errors,
        };
        ext.start_frame(&mut ctx, Time::from_nanos(5000), "map", "map");
        let pose = ext.base().renderables().get("r").unwrap().render_pose();
        assert!((pose.position.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_all_clears_reported_errors() {
        let (mut ext, tree, _errors) = setup();
        let mut settings = SettingsManager::new();
        let mut config = PanelConfig::new();
        let path = SettingsPath::new(["dots", "r"]);

        {
            let mut ctx = FrameContext {
                transform_tree: &tree,
                errors: settings.errors_mut(),
            };
            ext.start_frame(&mut ctx, Time::from_nanos(1000), "base_link", "map");
        }
        assert!(settings.errors().has_error(&path, ErrorKind::MissingTransform));

        let mut ctx = ActionContext {
            config: &mut config,
            settings: &mut settings,
        };
        ext.remove_all_renderables(&mut ctx);

        assert!(settings.errors().is_empty());
        assert!(ext.base().renderables().is_empty());
    }

    #[test]
    fn test_frame_pass_runs_in_attachment_order() {
        // Two renderables share a settings path; one frame resolves, the
        // other does not. The later-attached renderable decides the error
        // state, regardless of map iteration order.
        let mut tree = TransformTree::new();
        link(&mut tree, "map", "lidar", 1000, 1.0);
        let path = SettingsPath::new(["dots", "shared"]);

        let attach = |ext: &mut Dots, key: &str, frame_id: &str| {
            ext.base_mut().renderables_mut().insert(
                key,
                Box::new(Dot {
                    name: key.to_string(),
                    user_data: BaseUserData::new(
                        frame_id,
                        Time::from_nanos(1000),
                        SettingsPath::new(["dots", "shared"]),
                    ),
                }),
            );
        };

        let mut ext = Dots {
            base: ExtensionBase::new("dots"),
        };
        attach(&mut ext, "bad", "radar");
        attach(&mut ext, "good", "lidar");
        let mut errors = LayerErrors::new();
        let mut ctx = FrameContext {
            transform_tree: &tree,
            errors: &mut errors,
        };
        ext.start_frame(&mut ctx, Time::from_nanos(1000), "map", "map");
        assert!(!errors.has_error(&path, ErrorKind::MissingTransform));

        let mut ext = Dots {
            base: ExtensionBase::new("dots"),
        };
        attach(&mut ext, "good", "lidar");
        attach(&mut ext, "bad", "radar");
        let mut errors = LayerErrors::new();
        let mut ctx = FrameContext {
            transform_tree: &tree,
            errors: &mut errors,
        };
        ext.start_frame(&mut ctx, Time::from_nanos(1000), "map", "map");
        assert!(errors.has_error(&path, ErrorKind::MissingTransform));
    }

    #[test]
    fn test_start_frame_idempotent() {
        let (mut ext, mut tree, mut errors) = setup();
        link(&mut tree, "map", "lidar", 1000, 7.0);

        for _ in 0..2 {
            let mut ctx = FrameContext {
                transform_tree: &tree,
                errors: &mut errors,
            };
            ext.start_frame(&mut ctx, Time::from_nanos(1000), "map", "map");
        }
        let pose = ext.base().renderables().get("r").unwrap().render_pose();
        assert!((pose.position.x - 7.0).abs() < 1e-9);
        assert!(errors.is_empty());
    }
}
