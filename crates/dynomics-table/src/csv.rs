//! Delimited-text loading.
//!
//! Every field is read as text; the dictionary, not the reader, decides how
//! a column is interpreted. Empty fields become nulls.

use std::path::Path;

use dynomics_model::DataDictionary;
use polars::prelude::*;
use tracing::debug;

use crate::error::{Result, TableError};
use crate::table::MetadataTable;

/// Reads a comma-separated file into a validated table.
pub fn read_csv(path: &Path, dictionary: DataDictionary) -> Result<MetadataTable> {
    read_delimited(path, b',', dictionary)
}

/// Reads a delimited file (tab, semicolon, ...) into a validated table.
pub fn read_delimited(
    path: &Path,
    separator: u8,
    dictionary: DataDictionary,
) -> Result<MetadataTable> {
    let data = read_text_frame(path, separator)?;
    MetadataTable::new(data, dictionary)
}

/// Reads a delimited file with a header row into an all-string DataFrame.
pub fn read_text_frame(path: &Path, separator: u8) -> Result<DataFrame> {
    let csv_error = |e: PolarsError| TableError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(csv_error)?
        .finish()
        .map_err(csv_error)?;

    debug!(
        path = %path.display(),
        columns = df.width(),
        rows = df.height(),
        "Read delimited file"
    );
    Ok(df)
}
