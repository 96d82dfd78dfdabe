//! Typed column schema for sample metadata.
//!
//! Column types validate and cast raw container values, null policies decide
//! which tokens count as missing, and the [`DataDictionary`] ties a set of
//! columns together and persists them as YAML.

pub mod column;
pub mod dictionary;
pub mod error;
pub mod null;
pub mod temporal;
pub mod value;

pub use column::{CategoryRename, ColumnKind, ColumnType, DataType};
pub use dictionary::DataDictionary;
pub use error::{ModelError, Result};
pub use null::{DEFAULT_NULL_TOKENS, NullPolicy};
pub use temporal::{TimeUnit, parse_timestamp};
pub use value::{CastValue, RawValue, format_numeric};
