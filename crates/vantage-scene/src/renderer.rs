//! The host renderer: extension registry, frame loop entry point, and the
//! cooperative task queue.
//!
//! Single-threaded by design: one loop calls [`Renderer::animation_frame`]
//! once per displayed frame, which synchronously drives every registered
//! extension. The only asynchrony is the deferred settings refresh queued
//! when an extension is added; it runs after the registering call stack
//! unwinds and strictly before the next frame.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use vantage_core::settings::{SettingsAction, SettingsManager};
use vantage_core::{PanelConfig, Result, Time, VantageError};
use vantage_transforms::TransformTree;

use crate::extension::{ActionContext, FrameContext, SceneExtension};

/// Visual theme of the host application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorScheme {
    /// Dark theme.
    #[default]
    Dark,
    /// Light theme.
    Light,
}

type Task = Box<dyn FnOnce(&mut Renderer) + Send>;

/// The host every scene extension plugs into.
pub struct Renderer {
    transform_tree: TransformTree,
    settings: SettingsManager,
    config: PanelConfig,
    color_scheme: ColorScheme,
    background_color: Option<[f64; 4]>,
    extensions: Vec<Box<dyn SceneExtension>>,
    tasks: VecDeque<Task>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer with no extensions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transform_tree: TransformTree::new(),
            settings: SettingsManager::new(),
            config: PanelConfig::new(),
            color_scheme: ColorScheme::default(),
            background_color: None,
            extensions: Vec::new(),
            tasks: VecDeque::new(),
        }
    }

    /// The transform graph, read-only for extensions.
    #[must_use]
    pub fn transform_tree(&self) -> &TransformTree {
        &self.transform_tree
    }

    /// Mutable transform graph access for the data-ingestion path. Writes
    /// happen between frames, never during one.
    pub fn transform_tree_mut(&mut self) -> &mut TransformTree {
        &mut self.transform_tree
    }

    /// The settings sink, including the per-renderable error table.
    #[must_use]
    pub fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    /// Mutable settings access.
    pub fn settings_mut(&mut self) -> &mut SettingsManager {
        &mut self.settings
    }

    /// The persisted panel configuration.
    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Mutates the panel configuration in place.
    pub fn update_config(&mut self, mutator: impl FnOnce(&mut PanelConfig)) {
        mutator(&mut self.config);
    }

    /// Registers a scene extension.
    ///
    /// Errors on a duplicate extension id. Queues a deferred task that
    /// pushes the extension's settings-tree contribution, so implementor
    /// construction completes before its settings are first queried.
    pub fn add_extension(&mut self, extension: Box<dyn SceneExtension>) -> Result<()> {
        let id = extension.extension_id().to_string();
        if self.extensions.iter().any(|e| e.extension_id() == id) {
            return Err(VantageError::ExtensionExists(id));
        }
        log::debug!("registering scene extension '{id}'");
        self.extensions.push(extension);

        self.queue_task(move |renderer| renderer.refresh_extension_settings(&id));
        Ok(())
    }

    /// Pushes the settings-tree contribution of the extension with the
    /// given id.
    fn refresh_extension_settings(&mut self, id: &str) {
        if let Some(extension) = self.extensions.iter().find(|e| e.extension_id() == id) {
            extension.update_settings_tree(&mut self.settings);
        }
    }

    /// Returns the extension with the given id.
    #[must_use]
    pub fn extension(&self, id: &str) -> Option<&dyn SceneExtension> {
        self.extensions
            .iter()
            .find(|e| e.extension_id() == id)
            .map(Box::as_ref)
    }

    /// Returns the mutable extension with the given id.
    pub fn extension_mut(&mut self, id: &str) -> Option<&mut Box<dyn SceneExtension>> {
        self.extensions.iter_mut().find(|e| e.extension_id() == id)
    }

    /// Schedules a zero-delay callback on the renderer's cooperative queue.
    ///
    /// Tasks run in FIFO order at the top of the next `animation_frame`,
    /// after the current call stack unwinds.
    pub fn queue_task(&mut self, task: impl FnOnce(&mut Renderer) + Send + 'static) {
        self.tasks.push_back(Box::new(task));
    }

    /// Runs all queued tasks. Tasks queued by a running task execute in the
    /// same drain.
    pub fn drain_tasks(&mut self) {
        while let Some(task) = self.tasks.pop_front() {
            task(self);
        }
    }

    /// The per-frame entry point: drains the task queue, then invokes
    /// `start_frame` on every extension in registration order.
    ///
    /// `current_time` is a monotonically non-decreasing playback timestamp;
    /// seeking backward is handled by [`Self::remove_all_renderables`] and
    /// re-ingestion, not here.
    pub fn animation_frame(
        &mut self,
        current_time: Time,
        render_frame_id: &str,
        fixed_frame_id: &str,
    ) {
        self.drain_tasks();
        for extension in &mut self.extensions {
            let mut ctx = FrameContext {
                transform_tree: &self.transform_tree,
                errors: self.settings.errors_mut(),
            };
            extension.start_frame(&mut ctx, current_time, render_frame_id, fixed_frame_id);
        }
    }

    /// Routes a settings-tree edit to every extension.
    pub fn handle_settings_action(&mut self, action: &SettingsAction) {
        for extension in &mut self.extensions {
            let mut ctx = ActionContext {
                config: &mut self.config,
                settings: &mut self.settings,
            };
            extension.handle_settings_action(&mut ctx, action);
        }
    }

    /// Applies a visual theme change to every extension.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme, background_color: Option<[f64; 4]>) {
        self.color_scheme = scheme;
        self.background_color = background_color;
        for extension in &mut self.extensions {
            extension.set_color_scheme(scheme, background_color);
        }
    }

    /// The current visual theme.
    #[must_use]
    pub fn color_scheme(&self) -> ColorScheme {
        self.color_scheme
    }

    /// Disposes and detaches every extension's renderables without removing
    /// the extensions, clearing the errors they reported. Used on seek and
    /// when a new data source loads.
    pub fn remove_all_renderables(&mut self) {
        for extension in &mut self.extensions {
            let mut ctx = ActionContext {
                config: &mut self.config,
                settings: &mut self.settings,
            };
            extension.remove_all_renderables(&mut ctx);
        }
    }

    /// Tears everything down: extensions, settings contributions, errors,
    /// and pending tasks.
    pub fn dispose(&mut self) {
        for extension in &mut self.extensions {
            extension.dispose();
        }
        self.extensions.clear();
        self.settings.clear();
        self.tasks.clear();
        self.transform_tree.clear();
        log::info!("renderer disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionBase;
    use vantage_core::settings::{SettingsPath, SettingsTreeEntry, SettingsTreeNode};

    struct Plain {
        base: ExtensionBase,
        label: String,
    }

    impl Plain {
        fn boxed(id: &str, label: &str) -> Box<dyn SceneExtension> {
            Box::new(Self {
                base: ExtensionBase::new(id),
                label: label.to_string(),
            })
        }
    }

    impl SceneExtension for Plain {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
        fn base(&self) -> &ExtensionBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ExtensionBase {
            &mut self.base
        }
        fn settings_nodes(&self) -> Vec<SettingsTreeEntry> {
            vec![SettingsTreeEntry {
                path: SettingsPath::new([self.base.extension_id()]),
                node: SettingsTreeNode::new(self.label.clone()),
            }]
        }
    }

    #[test]
    fn test_duplicate_extension_rejected() {
        let mut renderer = Renderer::new();
        renderer.add_extension(Plain::boxed("grid", "Grid")).unwrap();
        assert!(matches!(
            renderer.add_extension(Plain::boxed("grid", "Grid 2")),
            Err(VantageError::ExtensionExists(_))
        ));
    }

    #[test]
    fn test_settings_contribution_is_deferred() {
        let mut renderer = Renderer::new();
        renderer.add_extension(Plain::boxed("grid", "Grid")).unwrap();

        // Not yet pushed: the contribution is queued, not applied
        assert!(renderer.settings().entries_for_key("grid").is_none());

        // The first frame drains the queue before extensions run
        renderer.animation_frame(Time::ZERO, "map", "map");
        let entries = renderer.settings().entries_for_key("grid").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].node.label, "Grid");
    }

    #[test]
    fn test_tasks_run_fifo_and_nested() {
        let mut renderer = Renderer::new();
        renderer.update_config(|config| {
            config
                .set_at_path(&SettingsPath::new(["order"]), serde_json::json!([]))
                .unwrap();
        });

        let push = |renderer: &mut Renderer, value: i64| {
            renderer.update_config(|config| {
                let path = SettingsPath::new(["order"]);
                let mut list = config.get_at_path(&path).cloned().unwrap();
                list.as_array_mut().unwrap().push(serde_json::json!(value));
                config.set_at_path(&path, list).unwrap();
            });
        };

        renderer.queue_task(move |r| {
            push(r, 1);
            r.queue_task(move |r| push(r, 3));
        });
        renderer.queue_task(move |r| push(r, 2));
        renderer.drain_tasks();

        let order = renderer
            .config()
            .get_at_path(&SettingsPath::new(["order"]))
            .unwrap();
        assert_eq!(order, &serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_dispose_clears_everything() {
        let mut renderer = Renderer::new();
        renderer.add_extension(Plain::boxed("grid", "Grid")).unwrap();
        renderer.animation_frame(Time::ZERO, "map", "map");
        assert!(renderer.settings().entries_for_key("grid").is_some());

        renderer.dispose();
        assert!(renderer.extension("grid").is_none());
        assert!(renderer.settings().entries_for_key("grid").is_none());
        assert!(renderer.settings().errors().is_empty());
    }
}
