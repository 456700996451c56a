//! Settings tree data model and the manager extensions publish into.
//!
//! Each scene extension contributes a flat list of [`SettingsTreeEntry`]
//! values keyed by its extension id. The sidebar UI (out of scope here)
//! consumes the manager's contents; this core only ever writes into it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layer_errors::LayerErrors;

/// A path into the settings tree, e.g. `["markers", "ns", "visible"]`.
///
/// Paths double as the keys of the per-renderable error table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsPath(Vec<String>);

impl SettingsPath {
    /// Creates a path from any iterable of string-like segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Appends a segment, returning the extended path.
    #[must_use]
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Returns true if `self` starts with all segments of `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl From<Vec<String>> for SettingsPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for SettingsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// A single editable field on a settings node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "camelCase")]
pub enum SettingsTreeField {
    /// A boolean toggle.
    Boolean { value: bool },
    /// A numeric input with an optional step size.
    Number { value: f64, step: Option<f64> },
    /// A free-form text input.
    Text { value: String },
    /// A single choice among fixed options.
    Select { value: String, options: Vec<String> },
    /// An RGBA color, components in `[0, 1]`.
    Rgba { value: [f64; 4] },
}

/// One node of the settings tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsTreeNode {
    /// Human-readable label.
    pub label: String,
    /// Optional icon name.
    pub icon: Option<String>,
    /// Visibility toggle state, when the node has one.
    pub visible: Option<bool>,
    /// Sort order among siblings.
    pub order: Option<i64>,
    /// Editable fields, keyed by field name.
    pub fields: BTreeMap<String, SettingsTreeField>,
}

impl SettingsTreeNode {
    /// Creates a node with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Sets the visibility toggle state.
    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field: SettingsTreeField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }
}

/// A settings-tree contribution: a node at a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsTreeEntry {
    /// Where the node lives in the tree.
    pub path: SettingsPath,
    /// The node itself.
    pub node: SettingsTreeNode,
}

/// An edit performed on the settings tree by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SettingsAction {
    /// A field value changed. A `null` value means "unset".
    Update { path: SettingsPath, value: Value },
    /// A node-level action button was pressed.
    PerformNode { path: SettingsPath, action_id: String },
}

/// The settings sink: per-extension tree contributions plus the error table.
///
/// Extensions only write into the manager; reading it back is the sidebar's
/// job.
#[derive(Default)]
pub struct SettingsManager {
    nodes_by_key: HashMap<String, Vec<SettingsTreeEntry>>,
    errors: LayerErrors,
}

impl SettingsManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the tree contribution registered under `key`.
    pub fn set_nodes_for_key(&mut self, key: impl Into<String>, entries: Vec<SettingsTreeEntry>) {
        let key = key.into();
        log::debug!("settings: {} entries for key '{key}'", entries.len());
        self.nodes_by_key.insert(key, entries);
    }

    /// Removes the contribution registered under `key`.
    pub fn remove_key(&mut self, key: &str) {
        self.nodes_by_key.remove(key);
    }

    /// Returns the entries registered under `key`.
    #[must_use]
    pub fn entries_for_key(&self, key: &str) -> Option<&[SettingsTreeEntry]> {
        self.nodes_by_key.get(key).map(Vec::as_slice)
    }

    /// Returns a snapshot of all entries, sorted by (order, path).
    #[must_use]
    pub fn entries(&self) -> Vec<&SettingsTreeEntry> {
        let mut entries: Vec<&SettingsTreeEntry> =
            self.nodes_by_key.values().flatten().collect();
        entries.sort_by(|a, b| {
            a.node
                .order
                .cmp(&b.node.order)
                .then_with(|| a.path.cmp(&b.path))
        });
        entries
    }

    /// Returns the registered keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes_by_key.keys().map(String::as_str)
    }

    /// The per-renderable error table.
    #[must_use]
    pub fn errors(&self) -> &LayerErrors {
        &self.errors
    }

    /// Mutable access to the error table.
    pub fn errors_mut(&mut self) -> &mut LayerErrors {
        &mut self.errors
    }

    /// Clears all contributions and errors.
    pub fn clear(&mut self) {
        self.nodes_by_key.clear();
        self.errors.clear();
    }
}
