//! Error types for column alignment.

use dynomics_table::TableError;
use thiserror::Error;

/// Failure to embed a text or compare two embeddings.
///
/// Never fatal to an alignment: the affected pairs get the maximum
/// description distance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    /// The embedding provider rejected or failed the request.
    #[error("embedding service failed: {message}")]
    Service { message: String },

    #[error("cannot embed empty text")]
    EmptyText,

    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Cosine distance is undefined for a zero vector.
    #[error("cannot compare a zero-length embedding")]
    ZeroVector,
}

impl EmbeddingError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }
}

/// Errors from alignment operations.
#[derive(Debug, Error)]
pub enum AlignError {
    #[error("unknown match mode '{mode}' (expected value, description or name)")]
    UnknownMode { mode: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Result type for alignment operations.
pub type Result<T> = std::result::Result<T, AlignError>;
