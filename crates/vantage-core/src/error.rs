//! Error types for vantage-rs.

use thiserror::Error;

/// The main error type for vantage-rs operations.
#[derive(Error, Debug)]
pub enum VantageError {
    /// A scene extension with the given identifier is already registered.
    #[error("scene extension '{0}' already registered")]
    ExtensionExists(String),

    /// A settings or config path was empty where a key is required.
    #[error("empty settings path")]
    EmptySettingsPath,

    /// The panel configuration root is not a JSON object.
    #[error("panel config root must be a JSON object, got {0}")]
    ConfigNotAnObject(String),
}

/// A specialized Result type for vantage-rs operations.
pub type Result<T> = std::result::Result<T, VantageError>;
