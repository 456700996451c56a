//! Renderable trait and the keyed collection extensions own.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vantage_core::settings::SettingsPath;
use vantage_core::Time;
use vantage_transforms::Pose;

/// Persisted per-renderable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseSettings {
    /// Whether the renderable participates in the frame update.
    pub visible: bool,
    /// Whether the displayed pose tracks the current playback time rather
    /// than staying pinned to the source message's time. Unset means locked.
    pub frame_locked: Option<bool>,
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            visible: true,
            frame_locked: None,
        }
    }
}

/// The per-renderable record every scene extension maintains.
#[derive(Debug, Clone)]
pub struct BaseUserData {
    /// The coordinate frame the source data is expressed in.
    pub frame_id: String,
    /// Timestamp of the source message.
    pub message_time: Time,
    /// The pose from the source message, in `frame_id`.
    pub pose: Pose,
    /// The resolved pose in the render frame. Derived state: recomputed
    /// every frame, kept only as the last known pose when resolution fails.
    pub render_pose: Pose,
    /// Where this renderable reports errors in the settings tree.
    pub settings_path: SettingsPath,
    /// Persisted settings.
    pub settings: BaseSettings,
}

impl BaseUserData {
    /// Creates a record with identity poses and default settings.
    pub fn new(
        frame_id: impl Into<String>,
        message_time: Time,
        settings_path: SettingsPath,
    ) -> Self {
        Self {
            frame_id: frame_id.into(),
            message_time,
            pose: Pose::IDENTITY,
            render_pose: Pose::IDENTITY,
            settings_path,
            settings: BaseSettings::default(),
        }
    }
}

/// A visual object bound to one data entity, owned by exactly one scene
/// extension.
pub trait Renderable: Any + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the stable identifier of this renderable.
    fn name(&self) -> &str;

    /// Returns the frame/time/settings record.
    fn user_data(&self) -> &BaseUserData;

    /// Returns the mutable frame/time/settings record.
    fn user_data_mut(&mut self) -> &mut BaseUserData;

    /// Returns the resolved pose in the render frame.
    fn render_pose(&self) -> Pose {
        self.user_data().render_pose
    }

    /// Writes the resolved pose.
    fn set_render_pose(&mut self, pose: Pose) {
        self.user_data_mut().render_pose = pose;
    }

    /// Releases any held resources. Called exactly once before removal.
    fn dispose(&mut self) {}
}

/// A keyed set of renderables attached to an extension's scene node.
///
/// Invariant: the key set of the map and the scene node's child list are
/// always identical; insert and remove touch both or neither.
#[derive(Default)]
pub struct RenderableSet {
    renderables: HashMap<String, Box<dyn Renderable>>,
    children: Vec<String>,
}

impl RenderableSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a renderable under `key`, attaching it as a scene child.
    ///
    /// An existing renderable under the same key is disposed and replaced.
    pub fn insert(&mut self, key: impl Into<String>, renderable: Box<dyn Renderable>) {
        let key = key.into();
        if self.renderables.contains_key(&key) {
            self.remove(&key);
        }
        self.children.push(key.clone());
        self.renderables.insert(key, renderable);
    }

    /// Returns the renderable under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&dyn Renderable> {
        self.renderables.get(key).map(Box::as_ref)
    }

    /// Returns the mutable renderable under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Box<dyn Renderable>> {
        self.renderables.get_mut(key)
    }

    /// Returns true if a renderable exists under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.renderables.contains_key(key)
    }

    /// Disposes and detaches the renderable under `key`.
    ///
    /// Returns true if a renderable was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.renderables.remove(key) {
            Some(mut renderable) => {
                renderable.dispose();
                self.children.retain(|child| child != key);
                true
            }
            None => false,
        }
    }

    /// Disposes and detaches every renderable.
    pub fn clear(&mut self) {
        for (_, mut renderable) in self.renderables.drain() {
            renderable.dispose();
        }
        self.children.clear();
    }

    /// Iterates over all renderables.
    pub fn values(&self) -> impl Iterator<Item = &dyn Renderable> {
        self.renderables.values().map(Box::as_ref)
    }

    /// Iterates mutably over all renderables.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Renderable>> {
        self.renderables.values_mut()
    }

    /// Iterates over keys and renderables.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Renderable)> {
        self.renderables
            .iter()
            .map(|(key, r)| (key.as_str(), r.as_ref()))
    }

    /// Returns the scene node's child identifiers, in attachment order.
    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Returns the number of renderables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }
}
