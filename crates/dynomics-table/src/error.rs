//! Error types for metadata tables.

use std::path::PathBuf;

use dynomics_model::ModelError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur while building or transforming a metadata table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Table columns without a dictionary entry.
    #[error("columns missing from the data dictionary: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// A rename would give two columns the same name.
    #[error("duplicate column name: {column}")]
    DuplicateColumn { column: String },

    #[error("column '{column}' not found in table")]
    ColumnNotFound { column: String },

    /// A rename mapping has no entry for a value or category.
    #[error("no mapping for '{key}' in column {column}")]
    KeyNotFound { column: String, key: String },

    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Column validation failed.
    #[error(transparent)]
    Model(ModelError),

    #[error("DataFrame operation failed: {0}")]
    Polars(#[from] PolarsError),
}

impl From<ModelError> for TableError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::KeyNotFound { column, key } => Self::KeyNotFound { column, key },
            ModelError::DuplicateColumn { column } => Self::DuplicateColumn { column },
            other => Self::Model(other),
        }
    }
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;
