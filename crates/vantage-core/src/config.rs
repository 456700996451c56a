//! Path-addressed panel configuration document.
//!
//! The configuration is a nested JSON object. `set_at_path` creates
//! intermediate objects on demand (replacing non-object values in the way);
//! `delete_at_path` removes the key entirely, so an unset value is absent
//! rather than `null`.

use serde_json::{Map, Value};

use crate::error::{Result, VantageError};
use crate::settings::SettingsPath;

/// A mutable, nested-path-addressed configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    root: Value,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl PanelConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from an existing JSON value.
    ///
    /// Returns an error unless the value is an object.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_object() {
            Ok(Self { root: value })
        } else {
            Err(VantageError::ConfigNotAnObject(value.to_string()))
        }
    }

    /// Returns the underlying JSON document.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Sets the value at `path`, creating intermediate objects as needed.
    pub fn set_at_path(&mut self, path: &SettingsPath, value: Value) -> Result<()> {
        let (leaf, parents) = path
            .segments()
            .split_last()
            .ok_or(VantageError::EmptySettingsPath)?;

        let mut current = &mut self.root;
        for segment in parents {
            current = ensure_object(current)
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(current).insert(leaf.clone(), value);
        Ok(())
    }

    /// Deletes the key at `path`. Missing paths are a no-op.
    pub fn delete_at_path(&mut self, path: &SettingsPath) -> Result<()> {
        let (leaf, parents) = path
            .segments()
            .split_last()
            .ok_or(VantageError::EmptySettingsPath)?;

        let mut current = &mut self.root;
        for segment in parents {
            match current.get_mut(segment) {
                Some(next) => current = next,
                None => return Ok(()),
            }
        }
        if let Some(map) = current.as_object_mut() {
            map.remove(leaf);
        }
        Ok(())
    }

    /// Returns the value at `path`, if present.
    #[must_use]
    pub fn get_at_path(&self, path: &SettingsPath) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = current.get(segment)?;
        }
        Some(current)
    }
}

/// Coerces `value` into an object (replacing anything else) and returns it.
fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}
