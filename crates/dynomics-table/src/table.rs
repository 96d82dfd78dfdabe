//! A DataFrame paired with the data dictionary that describes it.

use std::collections::{BTreeMap, BTreeSet};

use dynomics_common::{column_raw_values, text_column};
use dynomics_model::{CastValue, ColumnType, DataDictionary, RawValue};
use polars::prelude::{Column, DataFrame};
use tracing::debug;

use crate::error::{Result, TableError};

/// Sample metadata: rows are samples, columns are described fields.
///
/// Every column of the frame has a dictionary entry and every cell conforms
/// to its column type. Renames return a new table; the original frame and
/// dictionary are never modified.
#[derive(Debug, Clone)]
pub struct MetadataTable {
    data: DataFrame,
    dictionary: DataDictionary,
}

impl MetadataTable {
    /// Checks the schema, then validates every column against its entry.
    pub fn new(data: DataFrame, dictionary: DataDictionary) -> Result<Self> {
        let missing: Vec<String> = data
            .get_column_names()
            .into_iter()
            .filter(|name| !dictionary.contains(name.as_str()))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TableError::SchemaMismatch { missing });
        }

        for column in data.get_columns() {
            let name = column.name().as_str();
            let column_type = dictionary
                .get(name)
                .ok_or_else(|| TableError::ColumnNotFound {
                    column: name.to_string(),
                })?;
            column_type.validate(&column_raw_values(column))?;
        }

        debug!(
            columns = data.width(),
            rows = data.height(),
            "Built metadata table"
        );
        Ok(Self { data, dictionary })
    }

    pub fn data_frame(&self) -> &DataFrame {
        &self.data
    }

    pub fn dictionary(&self) -> &DataDictionary {
        &self.dictionary
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Column types in table order.
    pub fn column_types(&self) -> impl Iterator<Item = &ColumnType> {
        self.data
            .get_columns()
            .iter()
            .filter_map(|column| self.dictionary.get(column.name().as_str()))
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn column_type(&self, name: &str) -> Result<&ColumnType> {
        self.column(name)?;
        self.dictionary
            .get(name)
            .ok_or_else(|| column_not_found(name))
    }

    pub fn raw_values(&self, name: &str) -> Result<Vec<RawValue>> {
        Ok(column_raw_values(self.column(name)?))
    }

    /// Casts one column through its dictionary entry.
    pub fn cast_column(&self, name: &str) -> Result<Vec<CastValue>> {
        let values = self.raw_values(name)?;
        Ok(self.column_type(name)?.cast(&values)?)
    }

    /// Renames table columns and dictionary keys together.
    ///
    /// Columns absent from `mapping` keep their name.
    pub fn rename_columns(&self, mapping: &BTreeMap<String, String>) -> Result<Self> {
        let dictionary = self.dictionary.rename_keys(mapping)?;

        let mut seen = BTreeSet::new();
        let mut columns: Vec<Column> = Vec::with_capacity(self.data.width());
        for column in self.data.get_columns() {
            let name = column.name().as_str();
            let target = mapping.get(name).map_or(name, String::as_str);
            if !seen.insert(target.to_string()) {
                return Err(TableError::DuplicateColumn {
                    column: target.to_string(),
                });
            }
            columns.push(column.clone().with_name(target.into()));
        }

        debug!(renamed = mapping.len(), "Renamed metadata columns");
        Ok(Self {
            data: DataFrame::new(columns)?,
            dictionary,
        })
    }

    /// Replaces each value of `name` by its entry in `mapping`.
    ///
    /// Null tokens and empty cells pass through unchanged. Any other value
    /// without an entry fails with [`TableError::KeyNotFound`]. On a
    /// categorical or ordinal column, categories with an entry in `mapping`
    /// are renamed too; the others are kept.
    pub fn rename_column_values(
        &self,
        name: &str,
        mapping: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let column_type = self.column_type(name)?;
        let values = self.raw_values(name)?;

        let mut renamed = Vec::with_capacity(values.len());
        for value in &values {
            if value.is_missing() {
                renamed.push(None);
            } else if column_type.is_null(value) {
                renamed.push(Some(value.to_string()));
            } else {
                let key = value.to_string();
                match mapping.get(&key) {
                    Some(target) => renamed.push(Some(target.clone())),
                    None => {
                        return Err(TableError::KeyNotFound {
                            column: name.to_string(),
                            key,
                        });
                    }
                }
            }
        }

        let mut dictionary = self.dictionary.clone();
        if column_type.categories().is_some() {
            dictionary.insert(column_type.map_categories(mapping)?);
        }

        let mut data = self.data.clone();
        data.with_column(text_column(name, renamed))?;
        debug!(column = name, "Renamed metadata values");
        Self::new(data, dictionary)
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.data.column(name).map_err(|_| column_not_found(name))
    }
}

fn column_not_found(name: &str) -> TableError {
    TableError::ColumnNotFound {
        column: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynomics_model::NullPolicy;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("id".into(), &["s1", "s2"]),
            Column::new("site".into(), &["gut", "skin"]),
        ])
        .unwrap()
    }

    fn dictionary() -> DataDictionary {
        DataDictionary::new()
            .with_column(ColumnType::identifier("id", "Sample"))
            .with_column(ColumnType::categorical(
                "site",
                "Body site",
                ["gut", "skin"],
                NullPolicy::default(),
            ))
            .with_column(ColumnType::free_text("notes", "Unused", NullPolicy::default()))
    }

    #[test]
    fn test_dictionary_may_describe_extra_columns() {
        let table = MetadataTable::new(frame(), dictionary()).unwrap();
        assert_eq!(table.column_names(), ["id", "site"]);
        assert_eq!(table.column_types().count(), 2);
        assert!(matches!(
            table.column_type("notes"),
            Err(TableError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_rename_columns_rejects_collisions() {
        let table = MetadataTable::new(frame(), dictionary()).unwrap();
        let mapping = BTreeMap::from([("id".to_string(), "site".to_string())]);
        assert!(matches!(
            table.rename_columns(&mapping),
            Err(TableError::DuplicateColumn { .. })
        ));
    }
}
