//! Error types for column validation and dictionary persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by column types and data dictionaries.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A single value violates the column's constraint.
    #[error("invalid value {value} for {kind} column {column}: expected {expected}")]
    InvalidValue {
        column: String,
        kind: String,
        value: String,
        expected: String,
    },

    /// One or more values violate the constraint. Used where errors stay
    /// column-level and do not name the offending value.
    #[error("invalid values for {kind} column {column}: expected {expected}")]
    InvalidValues {
        column: String,
        kind: String,
        expected: String,
    },

    /// The operation only applies to other column kinds.
    #[error("{operation} is not supported for {kind} column {column}")]
    Unsupported {
        column: String,
        kind: String,
        operation: &'static str,
    },

    /// A rename mapping does not cover a required key.
    #[error("no mapping for '{key}' in column {column}")]
    KeyNotFound { column: String, key: String },

    /// Two columns would share a name.
    #[error("duplicate column name: {column}")]
    DuplicateColumn { column: String },

    /// The dictionary document is malformed.
    #[error("malformed data dictionary: {message}")]
    Format { message: String },

    /// Serializing the dictionary failed.
    #[error("failed to serialize data dictionary: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
