//! Core abstractions for vantage-rs.
//!
//! This crate provides the fundamental types used throughout vantage-rs:
//! - [`Time`] playback timestamps (integer nanoseconds)
//! - The settings tree data model and [`SettingsManager`] sink
//! - The path-keyed [`LayerErrors`] table for per-renderable error reporting
//! - [`PanelConfig`], the path-addressed panel configuration document

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod layer_errors;
pub mod settings;
pub mod time;

pub use config::PanelConfig;
pub use error::{Result, VantageError};
pub use layer_errors::{ErrorKind, LayerErrors};
pub use settings::{
    SettingsAction, SettingsManager, SettingsPath, SettingsTreeEntry, SettingsTreeField,
    SettingsTreeNode,
};
pub use time::Time;
