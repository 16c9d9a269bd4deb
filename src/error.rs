//! Error types for keeper
//!
//! Exit codes:
//! - 0: Success
//! - 1: No plugins could be loaded (nothing to run)
//! - 2: User error (bad args, unknown plugin, missing trackable)
//! - 3: Operation failed (storage, IO, serialization)

use thiserror::Error;

/// Exit codes for the keeper binary
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const NO_PLUGINS: i32 = 1;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 3;
}

/// Main error type for keeper operations
#[derive(Error, Debug)]
pub enum Error {
    // Bootstrap (exit code 1)
    #[error("No plugins found! Please add at least one plugin to begin ({kind} providers)")]
    NoPlugins { kind: &'static str },

    // User errors (exit code 2)
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("No migrations found for plugin '{0}'")]
    NoMigrations(String),

    #[error("Invalid migration action '{0}': action must be 'create' or 'drop'")]
    InvalidMigrationAction(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Trackable not found: {0}")]
    TrackableNotFound(i64),

    // Operation failures (exit code 3)
    #[error("Plugin '{plugin}' failed to load: {reason}")]
    PluginLoad { plugin: String, reason: String },

    #[error("Foreign key violation: trackable {trackable_id} does not exist")]
    ForeignKeyViolation { trackable_id: i64 },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NoPlugins { .. } => exit_codes::NO_PLUGINS,

            Error::UnknownPlugin(_)
            | Error::NoMigrations(_)
            | Error::InvalidMigrationAction(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::TrackableNotFound(_) => exit_codes::USER_ERROR,

            Error::PluginLoad { .. }
            | Error::ForeignKeyViolation { .. }
            | Error::Sqlite(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output, when the variant carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NoPlugins { kind } => Some(serde_json::json!({ "providers": kind })),
            Error::TrackableNotFound(id) => Some(serde_json::json!({ "trackable_id": id })),
            Error::ForeignKeyViolation { trackable_id } => {
                Some(serde_json::json!({ "trackable_id": trackable_id }))
            }
            Error::PluginLoad { plugin, .. } => Some(serde_json::json!({ "plugin": plugin })),
            _ => None,
        }
    }
}

/// Result type alias for keeper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
