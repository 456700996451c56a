//! Marker scene extension: keyed visual primitives driven by streamed
//! marker messages.
//!
//! Markers are keyed by `"{namespace}:{id}"`. An `Add` creates or replaces,
//! `Delete` removes one marker, `DeleteAll` clears the scene. Non-zero
//! lifetimes expire markers during the frame update, before the pose pass.
//! Each marker reports errors at its own `markers/<ns>/<id>` settings path,
//! and removal by any route also clears that path's entries.

use std::any::Any;
use std::collections::BTreeMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vantage_core::layer_errors::LayerErrors;
use vantage_core::settings::{
    SettingsAction, SettingsPath, SettingsTreeEntry, SettingsTreeNode,
};
use vantage_core::Time;
use vantage_scene::{
    update_renderable_poses, ActionContext, BaseUserData, ExtensionBase, FrameContext,
    Renderable, SceneExtension,
};
use vantage_transforms::Pose;

/// Extension id and settings-tree root for markers.
pub const MARKERS_EXTENSION_ID: &str = "markers";

/// What a marker message does to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerAction {
    /// Create or replace the marker under its key.
    Add,
    /// Remove the marker under its key.
    Delete,
    /// Remove every marker.
    DeleteAll,
}

/// The visual primitive a marker renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerKind {
    Arrow,
    Cube,
    Sphere,
    Cylinder,
    LineStrip,
    Points,
    Text,
}

/// A decoded marker message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerMessage {
    /// Namespace, grouping markers under one settings node.
    pub ns: String,
    /// Id unique within the namespace.
    pub id: i32,
    /// What to do with this marker.
    pub action: MarkerAction,
    /// Coordinate frame the pose is expressed in.
    pub frame_id: String,
    /// Source timestamp.
    pub stamp: Time,
    /// Pose in `frame_id`.
    pub pose: Pose,
    /// Visual primitive.
    pub kind: MarkerKind,
    /// Extents of the primitive.
    pub scale: DVec3,
    /// RGBA color, components in `[0, 1]`.
    pub color: [f64; 4],
    /// Whether the displayed pose tracks playback time.
    pub frame_locked: bool,
    /// Lifetime in nanoseconds from receive time; 0 means forever.
    pub lifetime_ns: u64,
}

/// One marker in the scene.
pub struct MarkerRenderable {
    name: String,
    ns: String,
    user_data: BaseUserData,
    /// Visual primitive.
    pub kind: MarkerKind,
    /// Extents of the primitive.
    pub scale: DVec3,
    /// RGBA color.
    pub color: [f64; 4],
    /// Absolute expiry time, when the marker has a lifetime.
    pub expires_at: Option<Time>,
}

impl MarkerRenderable {
    /// The marker's namespace.
    #[must_use]
    pub fn ns(&self) -> &str {
        &self.ns
    }
}

impl Renderable for MarkerRenderable {
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

/// Scene extension rendering marker messages.
pub struct MarkerScene {
    base: ExtensionBase,
    /// Per-namespace visibility, the persisted setting behind each
    /// namespace's settings node.
    ns_visibility: BTreeMap<String, bool>,
    /// Settings paths of markers removed outside a frame, whose error
    /// entries still need clearing.
    stale_error_paths: Vec<SettingsPath>,
}

impl Default for MarkerScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerScene {
    /// Creates an empty marker scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: ExtensionBase::new(MARKERS_EXTENSION_ID),
            ns_visibility: BTreeMap::new(),
            stale_error_paths: Vec::new(),
        }
    }

    /// Ingests one marker message. `receive_time` anchors lifetimes.
    ///
    /// Changing the namespace set changes the settings-node set; the caller
    /// refreshes the settings tree after an ingestion batch.
    pub fn handle_marker(&mut self, marker: &MarkerMessage, receive_time: Time) {
        let key = marker_key(&marker.ns, marker.id);
        match marker.action {
            MarkerAction::Add => {
                let visible = *self.ns_visibility.entry(marker.ns.clone()).or_insert(true);

                let mut user_data = BaseUserData::new(
                    marker.frame_id.clone(),
                    marker.stamp,
                    marker_settings_path(&marker.ns, marker.id),
                );
                user_data.pose = marker.pose;
                user_data.settings.visible = visible;
                user_data.settings.frame_locked = Some(marker.frame_locked);

                let expires_at = (marker.lifetime_ns > 0)
                    .then(|| receive_time.saturating_add_nanos(marker.lifetime_ns));

                self.base.renderables_mut().insert(
                    key.clone(),
                    Box::new(MarkerRenderable {
                        name: key,
                        ns: marker.ns.clone(),
                        user_data,
                        kind: marker.kind,
                        scale: marker.scale,
                        color: marker.color,
                        expires_at,
                    }),
                );
            }
            MarkerAction::Delete => {
                if self.base.renderables_mut().remove(&key) {
                    self.stale_error_paths
                        .push(marker_settings_path(&marker.ns, marker.id));
                }
            }
            MarkerAction::DeleteAll => {
                let paths: Vec<SettingsPath> = self
                    .base
                    .renderables()
                    .values()
                    .map(|r| r.user_data().settings_path.clone())
                    .collect();
                self.stale_error_paths.extend(paths);
                self.base.renderables_mut().clear();
            }
        }
    }

    /// Returns the marker under `"{ns}:{id}"`.
    #[must_use]
    pub fn marker(&self, ns: &str, id: i32) -> Option<&MarkerRenderable> {
        self.base
            .renderables()
            .get(&marker_key(ns, id))
            .and_then(|r| r.as_any().downcast_ref())
    }

    fn set_namespace_visibility(&mut self, ns: &str, visible: bool) {
        self.ns_visibility.insert(ns.to_string(), visible);
        for renderable in self.base.renderables_mut().values_mut() {
            let Some(marker) = renderable.as_any_mut().downcast_mut::<MarkerRenderable>() else {
                continue;
            };
            if marker.ns == ns {
                marker.user_data.settings.visible = visible;
            }
        }
    }

    fn expire_markers(&mut self, current_time: Time, errors: &mut LayerErrors) {
        let expired: Vec<(String, SettingsPath)> = self
            .base
            .renderables()
            .iter()
            .filter(|(_, renderable)| {
                renderable
                    .as_any()
                    .downcast_ref::<MarkerRenderable>()
                    .and_then(|marker| marker.expires_at)
                    .is_some_and(|expires_at| expires_at <= current_time)
            })
            .map(|(key, renderable)| {
                (key.to_string(), renderable.user_data().settings_path.clone())
            })
            .collect();
        for (key, path) in expired {
            self.base.renderables_mut().remove(&key);
            errors.clear_path(&path);
        }
    }
}

impl SceneExtension for MarkerScene {
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

    fn settings_nodes(&self) -> Vec<SettingsTreeEntry> {
        self.ns_visibility
            .iter()
            .enumerate()
            .map(|(i, (ns, visible))| SettingsTreeEntry {
                path: SettingsPath::new([MARKERS_EXTENSION_ID, ns.as_str()]),
                node: SettingsTreeNode::new(ns.clone())
                    .with_visible(*visible)
                    .with_order(i64::try_from(i).unwrap_or(i64::MAX)),
            })
            .collect()
    }

    fn handle_settings_action(&mut self, ctx: &mut ActionContext<'_>, action: &SettingsAction) {
        let SettingsAction::Update { path, value } = action else {
            return;
        };
        let [root, ns, field] = path.segments() else {
            return;
        };
        if root.as_str() != MARKERS_EXTENSION_ID || field.as_str() != "visible" {
            return;
        }
        let ns = ns.clone();

        // Null means "unset": drop the key and fall back to visible
        let visible = value.as_bool();
        self.set_namespace_visibility(&ns, visible.unwrap_or(true));
        self.save_setting(ctx, path, visible.map(Value::Bool));
    }

    fn remove_all_renderables(&mut self, ctx: &mut ActionContext<'_>) {
        for path in self.stale_error_paths.drain(..) {
            ctx.settings.errors_mut().clear_path(&path);
        }
        let paths: Vec<SettingsPath> = self
            .base
            .renderables()
            .values()
            .map(|r| r.user_data().settings_path.clone())
            .collect();
        for path in &paths {
            ctx.settings.errors_mut().clear_path(path);
        }

        // Namespaces and their persisted visibility are derived from data; a
        // seek or new data source starts them over, config included
        for ns in self.ns_visibility.keys() {
            let path = SettingsPath::new([MARKERS_EXTENSION_ID, ns.as_str()]);
            if let Err(err) = ctx.config.delete_at_path(&path) {
                log::error!("failed to clear config at '{path}': {err}");
            }
        }
        self.ns_visibility.clear();

        self.base.renderables_mut().clear();
        self.update_settings_tree(ctx.settings);
    }

    fn start_frame(
        &mut self,
        ctx: &mut FrameContext<'_>,
        current_time: Time,
        render_frame_id: &str,
        fixed_frame_id: &str,
    ) {
        for path in self.stale_error_paths.drain(..) {
            ctx.errors.clear_path(&path);
        }
        self.expire_markers(current_time, ctx.errors);
        update_renderable_poses(
            self.base_mut(),
            ctx,
            current_time,
            render_frame_id,
            fixed_frame_id,
        );
    }
}

fn marker_key(ns: &str, id: i32) -> String {
    format!("{ns}:{id}")
}

fn marker_settings_path(ns: &str, id: i32) -> SettingsPath {
    SettingsPath::new([MARKERS_EXTENSION_ID.to_string(), ns.to_string(), id.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;

    fn message(ns: &str, id: i32, action: MarkerAction) -> MarkerMessage {
        MarkerMessage {
            ns: ns.to_string(),
            id,
            action,
            frame_id: "base_link".to_string(),
            stamp: Time::from_nanos(1000),
            pose: Pose::new(DVec3::new(1.0, 0.0, 0.0), DQuat::IDENTITY),
            kind: MarkerKind::Cube,
            scale: DVec3::ONE,
            color: [1.0, 0.0, 0.0, 1.0],
            frame_locked: false,
            lifetime_ns: 0,
        }
    }

    #[test]
    fn test_add_delete_delete_all() {
        let mut scene = MarkerScene::new();
        scene.handle_marker(&message("obstacles", 1, MarkerAction::Add), Time::ZERO);
        scene.handle_marker(&message("obstacles", 2, MarkerAction::Add), Time::ZERO);
        scene.handle_marker(&message("path", 1, MarkerAction::Add), Time::ZERO);
        assert_eq!(scene.base().renderables().len(), 3);

        scene.handle_marker(&message("obstacles", 1, MarkerAction::Delete), Time::ZERO);
        assert_eq!(scene.base().renderables().len(), 2);
        assert!(scene.marker("obstacles", 1).is_none());
        assert!(scene.marker("obstacles", 2).is_some());

        scene.handle_marker(&message("path", 9, MarkerAction::DeleteAll), Time::ZERO);
        assert!(scene.base().renderables().is_empty());
    }

    #[test]
    fn test_add_replaces_same_key() {
        let mut scene = MarkerScene::new();
        scene.handle_marker(&message("obstacles", 1, MarkerAction::Add), Time::ZERO);

        let mut updated = message("obstacles", 1, MarkerAction::Add);
        updated.kind = MarkerKind::Sphere;
        scene.handle_marker(&updated, Time::ZERO);

        assert_eq!(scene.base().renderables().len(), 1);
        assert_eq!(scene.marker("obstacles", 1).unwrap().kind, MarkerKind::Sphere);
    }

    #[test]
    fn test_lifetime_expiry() {
        let mut scene = MarkerScene::new();
        let mut msg = message("obstacles", 1, MarkerAction::Add);
        msg.lifetime_ns = 500;
        scene.handle_marker(&msg, Time::from_nanos(1000));

        let mut errors = LayerErrors::new();
        scene.expire_markers(Time::from_nanos(1400), &mut errors);
        assert_eq!(scene.base().renderables().len(), 1);

        scene.expire_markers(Time::from_nanos(1500), &mut errors);
        assert!(scene.base().renderables().is_empty());
    }

    #[test]
    fn test_expiry_clears_reported_error() {
        let mut scene = MarkerScene::new();
        let mut msg = message("obstacles", 1, MarkerAction::Add);
        msg.lifetime_ns = 500;
        scene.handle_marker(&msg, Time::from_nanos(1000));

        let path = marker_settings_path("obstacles", 1);
        let mut errors = LayerErrors::new();
        errors.add(
            path.clone(),
            vantage_core::ErrorKind::MissingTransform,
            "unresolved",
        );

        scene.expire_markers(Time::from_nanos(1500), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_delete_marks_error_path_stale() {
        let mut scene = MarkerScene::new();
        scene.handle_marker(&message("obstacles", 1, MarkerAction::Add), Time::ZERO);
        scene.handle_marker(&message("obstacles", 1, MarkerAction::Delete), Time::ZERO);

        assert_eq!(
            scene.stale_error_paths,
            vec![marker_settings_path("obstacles", 1)]
        );

        // Deleting a marker that never existed leaves nothing to clear
        scene.handle_marker(&message("obstacles", 9, MarkerAction::Delete), Time::ZERO);
        assert_eq!(scene.stale_error_paths.len(), 1);
    }

    #[test]
    fn test_new_markers_inherit_namespace_visibility() {
        let mut scene = MarkerScene::new();
        scene.handle_marker(&message("obstacles", 1, MarkerAction::Add), Time::ZERO);
        scene.set_namespace_visibility("obstacles", false);

        scene.handle_marker(&message("obstacles", 2, MarkerAction::Add), Time::ZERO);
        assert!(!scene.marker("obstacles", 1).unwrap().user_data().settings.visible);
        assert!(!scene.marker("obstacles", 2).unwrap().user_data().settings.visible);

        let nodes = scene.settings_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node.visible, Some(false));
    }
}
