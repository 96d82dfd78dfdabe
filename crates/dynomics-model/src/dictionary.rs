//! The data dictionary: an ordered schema of column types.
//!
//! ## Document format
//!
//! Dictionaries persist as a YAML mapping from column name to a record:
//!
//! ```text
//! host_age:
//!   data_type: Continuous
//!   description: Age of the host at sampling
//!   unit: years
//! body_site:
//!   data_type: Categorical
//!   description: Body site the sample was taken from
//!   categories: [gut, skin, oral]
//!   null_values: [not_collected, NA]
//! ```
//!
//! `null_values` is written only when a column overrides the default tokens.
//! Key order, category order and null-token order are preserved. Every record
//! is rebuilt through the column constructors on load, so a document that
//! names an unknown type, omits a required field, or sets a field the type
//! does not carry is rejected.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::column::{ColumnKind, ColumnType, DataType};
use crate::error::{ModelError, Result};
use crate::null::NullPolicy;

/// On-disk form of a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnRecord {
    data_type: DataType,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    null_values: Option<NullPolicy>,
}

impl ColumnRecord {
    fn from_column(column: &ColumnType) -> Self {
        Self {
            data_type: column.data_type(),
            description: column.description.clone(),
            unit: column.unit().map(str::to_string),
            categories: column.categories().map(<[String]>::to_vec),
            null_values: column
                .null_policy()
                .filter(|policy| !policy.is_default())
                .cloned(),
        }
    }

    fn into_column(self, name: String) -> Result<ColumnType> {
        let data_type = self.data_type;
        if self.unit.is_some() && data_type != DataType::Continuous {
            return Err(unexpected_field(&name, data_type, "unit"));
        }
        if self.categories.is_some()
            && !matches!(data_type, DataType::Categorical | DataType::Ordinal)
        {
            return Err(unexpected_field(&name, data_type, "categories"));
        }
        if self.null_values.is_some() && !data_type.has_null_policy() {
            return Err(unexpected_field(&name, data_type, "null_values"));
        }

        let null_policy = self.null_values.unwrap_or_default();
        let kind = match data_type {
            DataType::Boolean => ColumnKind::Boolean { null_policy },
            DataType::Continuous => ColumnKind::Continuous {
                unit: self
                    .unit
                    .ok_or_else(|| missing_field(&name, data_type, "unit"))?,
                null_policy,
            },
            DataType::Categorical => ColumnKind::Categorical {
                categories: self
                    .categories
                    .ok_or_else(|| missing_field(&name, data_type, "categories"))?,
                null_policy,
            },
            DataType::Ordinal => ColumnKind::Ordinal {
                categories: self
                    .categories
                    .ok_or_else(|| missing_field(&name, data_type, "categories"))?,
                null_policy,
            },
            DataType::FreeText => ColumnKind::FreeText { null_policy },
            DataType::Identifier => ColumnKind::Identifier,
            DataType::Biospecimen => ColumnKind::Biospecimen,
            DataType::Temporal => ColumnKind::Temporal,
            DataType::Spatial1d => ColumnKind::Spatial1d,
            DataType::Spatial2d => ColumnKind::Spatial2d,
            DataType::Spatial3d => ColumnKind::Spatial3d,
        };
        Ok(ColumnType::new(name, self.description, kind))
    }
}

fn unexpected_field(name: &str, data_type: DataType, field: &str) -> ModelError {
    ModelError::format(format!(
        "column {name}: field '{field}' is not allowed for {data_type} columns"
    ))
}

fn missing_field(name: &str, data_type: DataType, field: &str) -> ModelError {
    ModelError::format(format!(
        "column {name}: {data_type} columns require '{field}'"
    ))
}

/// The first document of a YAML stream; a stream without documents is null.
fn first_document(mut documents: serde_yaml::Deserializer<'_>) -> Result<Value> {
    match documents.next() {
        Some(document) => Value::deserialize(document)
            .map_err(|e| ModelError::format(format!("invalid YAML: {e}"))),
        None => Ok(Value::Null),
    }
}

/// Ordered mapping from column name to [`ColumnType`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDictionary {
    columns: Vec<ColumnType>,
}

impl DataDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnType> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Adds a column, replacing (in place) any entry with the same name.
    pub fn insert(&mut self, column: ColumnType) -> Option<ColumnType> {
        match self.position(&column.name) {
            Some(index) => Some(std::mem::replace(&mut self.columns[index], column)),
            None => {
                self.columns.push(column);
                None
            }
        }
    }

    pub fn with_column(mut self, column: ColumnType) -> Self {
        self.insert(column);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<ColumnType> {
        self.position(name).map(|index| self.columns.remove(index))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnType> {
        self.columns.iter()
    }

    /// Returns a new dictionary with keys renamed per `mapping`.
    ///
    /// Columns absent from `mapping` keep their name. Fails if two columns
    /// would end up with the same name.
    pub fn rename_keys(&self, mapping: &BTreeMap<String, String>) -> Result<Self> {
        let mut renamed = Self::new();
        for column in &self.columns {
            let column = match mapping.get(&column.name) {
                Some(new_name) => column.renamed(new_name.clone()),
                None => column.clone(),
            };
            if renamed.contains(&column.name) {
                return Err(ModelError::DuplicateColumn {
                    column: column.name,
                });
            }
            renamed.columns.push(column);
        }
        Ok(renamed)
    }

    /// Parses a YAML document into a new dictionary.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::from_document(first_document(serde_yaml::Deserializer::from_str(text))?)
    }

    /// Replaces the whole content of this dictionary with the document read
    /// from `reader`. On failure the dictionary is left unchanged.
    pub fn read<R: Read>(&mut self, reader: R) -> Result<()> {
        let document = first_document(serde_yaml::Deserializer::from_reader(reader))?;
        *self = Self::from_document(document)?;
        tracing::debug!(columns = self.len(), "Loaded data dictionary");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ModelError::io(path, e))?;
        let mut dictionary = Self::new();
        dictionary.read(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), "Read data dictionary file");
        Ok(dictionary)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_document()?)?)
    }

    /// Serializes every column to `writer`.
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_yaml::to_writer(writer, &self.to_document()?)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ModelError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush().map_err(|e| ModelError::io(path, e))?;
        tracing::debug!(
            path = %path.display(),
            columns = self.len(),
            "Wrote data dictionary"
        );
        Ok(())
    }

    fn from_document(document: Value) -> Result<Self> {
        let mapping = match document {
            Value::Null => return Ok(Self::new()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(ModelError::format(
                    "top level must map column names to column records",
                ));
            }
        };

        let mut dictionary = Self::new();
        for (key, value) in mapping {
            let name = match key {
                Value::String(name) => name,
                other => {
                    return Err(ModelError::format(format!(
                        "column names must be strings, found {other:?}"
                    )));
                }
            };
            if dictionary.contains(&name) {
                return Err(ModelError::DuplicateColumn { column: name });
            }
            let record: ColumnRecord = serde_yaml::from_value(value)
                .map_err(|e| ModelError::format(format!("column {name}: {e}")))?;
            dictionary.columns.push(record.into_column(name)?);
        }
        Ok(dictionary)
    }

    fn to_document(&self) -> Result<Value> {
        let mut mapping = Mapping::new();
        for column in &self.columns {
            let record = serde_yaml::to_value(ColumnRecord::from_column(column))?;
            mapping.insert(Value::String(column.name.clone()), record);
        }
        Ok(Value::Mapping(mapping))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }
}

impl FromIterator<ColumnType> for DataDictionary {
    fn from_iter<I: IntoIterator<Item = ColumnType>>(iter: I) -> Self {
        let mut dictionary = Self::new();
        for column in iter {
            dictionary.insert(column);
        }
        dictionary
    }
}

impl<'a> IntoIterator for &'a DataDictionary {
    type Item = &'a ColumnType;
    type IntoIter = std::slice::Iter<'a, ColumnType>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
