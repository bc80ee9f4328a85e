//! Error types for the todos service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every todos crate.
///
/// Variants are structured so the remote-call layer can report a stable
/// `kind` to clients alongside the human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoError {
    /// Input rejected before reaching the store (e.g. a blank title)
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Entity not found, or not visible in the caller's scope
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// Caller identity does not match the requested owner
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored document has a schema version this build cannot read
    #[error("Migration error: {0}")]
    Migration(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TodoError {
    /// Creates a Validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Migration error
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Short machine-readable name of the variant, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Io { .. } => "io",
            Self::DataAccess(_) => "data_access",
            Self::Serialization { .. } => "serialization",
            Self::Config(_) => "config",
            Self::Migration(_) => "migration",
            Self::Internal(_) => "internal",
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for TodoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TodoError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, TodoError>`.
pub type Result<T> = std::result::Result<T, TodoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(TodoError::validation("title", "empty").kind(), "validation");
        assert_eq!(TodoError::not_found("task", "abc").kind(), "not_found");
        assert_eq!(TodoError::unauthorized("nope").kind(), "unauthorized");
    }

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TodoError = io.into();
        match err {
            TodoError::Io { message } => assert!(message.contains("PermissionDenied")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_found_display() {
        let err = TodoError::not_found("task", "42");
        assert_eq!(err.to_string(), "Entity not found: task '42'");
        assert!(err.is_not_found());
    }
}
