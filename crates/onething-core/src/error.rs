//! Core error types for onething-core.
//!
//! Invalid gameplay operations (overspending, placing into an occupied cell,
//! completing a finished task) are not errors: they come back as `bool` or
//! `Option` results. The types here cover storage, configuration and the
//! remote mirror.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for onething-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Remote mirror errors
    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),

    /// A store was used before its persisted record was loaded.
    #[error("Store '{key}' has not been hydrated yet")]
    NotHydrated { key: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised by the remote mirror collaborator.
///
/// These never reach gameplay state; the outbox logs and drops them.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Mirror is not configured (no base URL or key)
    #[error("Remote mirror is not configured")]
    NotConfigured,

    /// Transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Unique constraint violated (e.g. friend code collision)
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// Lookup returned nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Base URL could not be joined with a table path
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_hydrated_message_names_the_store() {
        let err = CoreError::NotHydrated {
            key: "onething-coins".into(),
        };
        assert_eq!(
            err.to_string(),
            "Store 'onething-coins' has not been hydrated yet"
        );
    }

    #[test]
    fn config_errors_convert_into_core_errors() {
        let err: CoreError = ConfigError::UnknownKey("timer.turbo".into()).into();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown configuration key: timer.turbo"
        );
    }

    #[test]
    fn sqlite_errors_map_to_query_failed() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
