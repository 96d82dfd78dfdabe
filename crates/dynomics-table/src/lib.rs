//! Metadata tables.
//!
//! A [`MetadataTable`] owns a Polars [`DataFrame`](polars::prelude::DataFrame)
//! together with the [`DataDictionary`](dynomics_model::DataDictionary) that
//! describes its columns. Construction checks the schema and validates every
//! column; renames produce new tables.

pub mod csv;
pub mod error;
pub mod table;

pub use csv::{read_csv, read_delimited, read_text_frame};
pub use error::{Result, TableError};
pub use table::MetadataTable;
