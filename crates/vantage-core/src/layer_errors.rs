//! Path-keyed error table surfaced next to settings nodes.
//!
//! Scene extensions report per-renderable conditions here instead of failing
//! the frame loop. Adding the same kind at the same path replaces the
//! previous message, so a condition re-reported every frame stays a single
//! entry.

use std::collections::{BTreeMap, HashMap};

use crate::settings::SettingsPath;

/// The kind of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// No transform path connects a renderable's frame to the render frame
    /// at the required time(s).
    MissingTransform,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTransform => write!(f, "MISSING_TRANSFORM"),
        }
    }
}

/// The error table: settings path -> (kind -> message).
#[derive(Debug, Default)]
pub struct LayerErrors {
    errors: HashMap<SettingsPath, BTreeMap<ErrorKind, String>>,
}

impl LayerErrors {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the error of `kind` at `path`.
    ///
    /// Re-adding an identical message is silent; it happens every frame while
    /// a condition persists.
    pub fn add(&mut self, path: SettingsPath, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        let by_kind = self.errors.entry(path.clone()).or_default();
        if by_kind.get(&kind) != Some(&message) {
            log::debug!("error {kind} at '{path}': {message}");
        }
        by_kind.insert(kind, message);
    }

    /// Removes the error of `kind` at `path`, if present.
    pub fn remove(&mut self, path: &SettingsPath, kind: ErrorKind) {
        if let Some(by_kind) = self.errors.get_mut(path) {
            if by_kind.remove(&kind).is_some() {
                log::debug!("error {kind} cleared at '{path}'");
            }
            if by_kind.is_empty() {
                self.errors.remove(path);
            }
        }
    }

    /// Removes every error at `path`.
    pub fn clear_path(&mut self, path: &SettingsPath) {
        self.errors.remove(path);
    }

    /// Removes every error in the table.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Returns true if an error of `kind` is current at `path`.
    #[must_use]
    pub fn has_error(&self, path: &SettingsPath, kind: ErrorKind) -> bool {
        self.errors
            .get(path)
            .is_some_and(|by_kind| by_kind.contains_key(&kind))
    }

    /// Returns the current message of `kind` at `path`.
    #[must_use]
    pub fn error_message(&self, path: &SettingsPath, kind: ErrorKind) -> Option<&str> {
        self.errors
            .get(path)
            .and_then(|by_kind| by_kind.get(&kind))
            .map(String::as_str)
    }

    /// Returns the total number of current errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.values().map(BTreeMap::len).sum()
    }

    /// Returns true if no errors are current.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
