//! Column alignment between metadata tables.
//!
//! Given a source and a target [`MetadataTable`](dynomics_table::MetadataTable),
//! the [`ColumnAligner`] finds, for each source column, the most similar
//! target column by cast values, by embedded descriptions, or by name.
//! Embeddings come from an injected [`Embedder`].

pub mod aligner;
pub mod distance;
pub mod embed;
pub mod error;
pub mod matrix;
pub mod utils;

pub use aligner::{
    Alignment, AlignmentOptions, ColumnAligner, ColumnMatch, ColumnMatching,
    MAX_DESCRIPTION_DISTANCE, MatchEntry, MatchMode, TableAlignment,
};
pub use distance::{MAX_VALUE_DISTANCE, ValueProfile, jaccard_distance, ks_statistic};
pub use embed::{DEFAULT_TRIGRAM_DIMENSION, Embedder, TrigramEmbedder, cosine_distance};
pub use error::{AlignError, EmbeddingError, Result};
pub use matrix::DistanceMatrix;
pub use utils::{name_distance, normalize_text};
