//! Column types for sample metadata.
//!
//! A [`ColumnType`] pairs a column's name and description with a closed
//! [`ColumnKind`] variant that carries only the constraints that kind needs:
//!
//! | Kind | Constraint | Cast output | Null policy |
//! |------|------------|-------------|-------------|
//! | Boolean | fixed literal set | `Bool` | yes |
//! | Continuous | real number, unit recorded | `Float` | yes |
//! | Categorical / Ordinal | member of `categories` | `Index` | yes |
//! | FreeText | text | `Text` | yes |
//! | Identifier / Biospecimen | text or integer | `Text` / `Int` | no |
//! | Temporal | timestamp scalar | `Float` (epoch seconds) | no |
//! | Spatial1d/2d/3d | k-tuple of real numbers | `Point` | no |
//!
//! `cast` always validates first and never drops or reorders rows: the output
//! has one element per input, null tokens becoming [`CastValue::Null`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::null::NullPolicy;
use crate::temporal::{TimeUnit, parse_timestamp};
use crate::value::{CastValue, RawValue};

const BOOLEAN_TEXT_LITERALS: [&str; 6] = ["True", "False", "Yes", "No", "0", "1"];
const BOOLEAN_TRUE_TEXT: [&str; 3] = ["True", "Yes", "1"];

/// Variant tag of a column, as written in dictionary documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Continuous,
    Categorical,
    Ordinal,
    FreeText,
    Identifier,
    Biospecimen,
    Temporal,
    Spatial1d,
    Spatial2d,
    Spatial3d,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "Boolean",
            DataType::Continuous => "Continuous",
            DataType::Categorical => "Categorical",
            DataType::Ordinal => "Ordinal",
            DataType::FreeText => "FreeText",
            DataType::Identifier => "Identifier",
            DataType::Biospecimen => "Biospecimen",
            DataType::Temporal => "Temporal",
            DataType::Spatial1d => "Spatial1d",
            DataType::Spatial2d => "Spatial2d",
            DataType::Spatial3d => "Spatial3d",
        }
    }

    /// Whether columns of this type carry a null policy.
    pub fn has_null_policy(&self) -> bool {
        matches!(
            self,
            DataType::Boolean
                | DataType::Continuous
                | DataType::Categorical
                | DataType::Ordinal
                | DataType::FreeText
        )
    }

    /// Number of axes for spatial types.
    pub fn spatial_axes(&self) -> Option<usize> {
        match self {
            DataType::Spatial1d => Some(1),
            DataType::Spatial2d => Some(2),
            DataType::Spatial3d => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Boolean" => Ok(DataType::Boolean),
            "Continuous" => Ok(DataType::Continuous),
            "Categorical" => Ok(DataType::Categorical),
            "Ordinal" => Ok(DataType::Ordinal),
            "FreeText" => Ok(DataType::FreeText),
            "Identifier" => Ok(DataType::Identifier),
            "Biospecimen" => Ok(DataType::Biospecimen),
            "Temporal" => Ok(DataType::Temporal),
            "Spatial1d" => Ok(DataType::Spatial1d),
            "Spatial2d" => Ok(DataType::Spatial2d),
            "Spatial3d" => Ok(DataType::Spatial3d),
            other => Err(format!("Unknown data type: {other}")),
        }
    }
}

/// Per-kind constraints of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    Boolean {
        null_policy: NullPolicy,
    },
    Continuous {
        /// Recorded for reference; never interpreted.
        unit: String,
        null_policy: NullPolicy,
    },
    Categorical {
        /// Insertion order defines the cast index.
        categories: Vec<String>,
        null_policy: NullPolicy,
    },
    Ordinal {
        /// Insertion order defines both the cast index and the rank.
        categories: Vec<String>,
        null_policy: NullPolicy,
    },
    FreeText {
        null_policy: NullPolicy,
    },
    Identifier,
    Biospecimen,
    Temporal,
    Spatial1d,
    Spatial2d,
    Spatial3d,
}

impl ColumnKind {
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Boolean { .. } => DataType::Boolean,
            ColumnKind::Continuous { .. } => DataType::Continuous,
            ColumnKind::Categorical { .. } => DataType::Categorical,
            ColumnKind::Ordinal { .. } => DataType::Ordinal,
            ColumnKind::FreeText { .. } => DataType::FreeText,
            ColumnKind::Identifier => DataType::Identifier,
            ColumnKind::Biospecimen => DataType::Biospecimen,
            ColumnKind::Temporal => DataType::Temporal,
            ColumnKind::Spatial1d => DataType::Spatial1d,
            ColumnKind::Spatial2d => DataType::Spatial2d,
            ColumnKind::Spatial3d => DataType::Spatial3d,
        }
    }
}

/// A single column definition within a data dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    pub name: String,
    pub description: String,
    pub kind: ColumnKind,
}

/// Result of renaming the categories of a categorical or ordinal column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRename {
    /// The column with its category list rewritten.
    pub column: ColumnType,
    /// Previously cast values translated to their new labels.
    pub values: Vec<CastValue>,
}

impl ColumnType {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }

    pub fn boolean(
        name: impl Into<String>,
        description: impl Into<String>,
        null_policy: NullPolicy,
    ) -> Self {
        Self::new(name, description, ColumnKind::Boolean { null_policy })
    }

    pub fn continuous(
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        null_policy: NullPolicy,
    ) -> Self {
        Self::new(
            name,
            description,
            ColumnKind::Continuous {
                unit: unit.into(),
                null_policy,
            },
        )
    }

    pub fn categorical<I, S>(
        name: impl Into<String>,
        description: impl Into<String>,
        categories: I,
        null_policy: NullPolicy,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            description,
            ColumnKind::Categorical {
                categories: categories.into_iter().map(Into::into).collect(),
                null_policy,
            },
        )
    }

    /// Categories are listed from lowest to highest rank.
    pub fn ordinal<I, S>(
        name: impl Into<String>,
        description: impl Into<String>,
        categories: I,
        null_policy: NullPolicy,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            description,
            ColumnKind::Ordinal {
                categories: categories.into_iter().map(Into::into).collect(),
                null_policy,
            },
        )
    }

    pub fn free_text(
        name: impl Into<String>,
        description: impl Into<String>,
        null_policy: NullPolicy,
    ) -> Self {
        Self::new(name, description, ColumnKind::FreeText { null_policy })
    }

    pub fn identifier(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ColumnKind::Identifier)
    }

    pub fn biospecimen(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ColumnKind::Biospecimen)
    }

    pub fn temporal(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ColumnKind::Temporal)
    }

    pub fn spatial_1d(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ColumnKind::Spatial1d)
    }

    pub fn spatial_2d(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ColumnKind::Spatial2d)
    }

    pub fn spatial_3d(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ColumnKind::Spatial3d)
    }

    pub fn data_type(&self) -> DataType {
        self.kind.data_type()
    }

    pub fn null_policy(&self) -> Option<&NullPolicy> {
        match &self.kind {
            ColumnKind::Boolean { null_policy }
            | ColumnKind::Continuous { null_policy, .. }
            | ColumnKind::Categorical { null_policy, .. }
            | ColumnKind::Ordinal { null_policy, .. }
            | ColumnKind::FreeText { null_policy } => Some(null_policy),
            _ => None,
        }
    }

    pub fn categories(&self) -> Option<&[String]> {
        match &self.kind {
            ColumnKind::Categorical { categories, .. } | ColumnKind::Ordinal { categories, .. } => {
                Some(categories.as_slice())
            }
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match &self.kind {
            ColumnKind::Continuous { unit, .. } => Some(unit.as_str()),
            _ => None,
        }
    }

    /// True when the value is missing under this column's null policy.
    ///
    /// Columns without a null policy never treat a value as null.
    pub fn is_null(&self, value: &RawValue) -> bool {
        self.null_policy()
            .is_some_and(|policy| policy.is_null(value))
    }

    /// Returns a copy of this column under a new name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Checks every non-null value against this column's constraint.
    ///
    /// Stops at the first failing value. Continuous columns report a single
    /// column-level error; spatial columns check tuple shape first and then
    /// each axis in turn.
    pub fn validate(&self, values: &[RawValue]) -> Result<()> {
        match &self.kind {
            ColumnKind::Continuous { null_policy, .. } => {
                let all_numeric = values
                    .iter()
                    .filter(|value| !null_policy.is_null(value))
                    .all(|value| value.to_f64().is_some());
                if all_numeric {
                    Ok(())
                } else {
                    Err(self.invalid_values("real numbers".to_string()))
                }
            }
            ColumnKind::Spatial1d | ColumnKind::Spatial2d | ColumnKind::Spatial3d => {
                self.validate_spatial(values)
            }
            _ => {
                for value in values {
                    if self.is_null(value) {
                        continue;
                    }
                    if !self.conforms(value) {
                        return Err(self.invalid_value(value));
                    }
                }
                Ok(())
            }
        }
    }

    /// Validates, then converts each value to its canonical typed form.
    pub fn cast(&self, values: &[RawValue]) -> Result<Vec<CastValue>> {
        self.validate(values)?;
        Ok(values
            .iter()
            .map(|value| {
                if self.is_null(value) {
                    CastValue::Null
                } else {
                    self.convert(value)
                }
            })
            .collect())
    }

    /// Position of `value` within an ordinal column's ranking.
    ///
    /// Returns `None` for unknown categories and non-ordinal columns.
    pub fn rank(&self, value: &str) -> Option<usize> {
        match &self.kind {
            ColumnKind::Ordinal { categories, .. } => categories.iter().position(|c| c == value),
            _ => None,
        }
    }

    /// Orders two categories of an ordinal column by rank.
    pub fn compare(&self, a: &str, b: &str) -> Option<Ordering> {
        Some(self.rank(a)?.cmp(&self.rank(b)?))
    }

    /// Renames the categories of a categorical or ordinal column.
    ///
    /// `mapping` must cover every category. `values` are previously cast
    /// indices; each is translated to the renamed label of the category it
    /// pointed at, and nulls stay null. `self` is left untouched.
    pub fn rename(
        &self,
        mapping: &BTreeMap<String, String>,
        values: &[CastValue],
    ) -> Result<CategoryRename> {
        let Some(categories) = self.categories() else {
            return Err(self.unsupported("category rename"));
        };

        let renamed_categories = categories
            .iter()
            .map(|category| {
                mapping
                    .get(category)
                    .cloned()
                    .ok_or_else(|| ModelError::KeyNotFound {
                        column: self.name.clone(),
                        key: category.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut renamed_values = Vec::with_capacity(values.len());
        for value in values {
            let renamed = match value {
                CastValue::Null => CastValue::Null,
                CastValue::Index(index) => match renamed_categories.get(*index) {
                    Some(label) => CastValue::Text(label.clone()),
                    None => {
                        return Err(ModelError::InvalidValue {
                            column: self.name.clone(),
                            kind: self.data_type().to_string(),
                            value: index.to_string(),
                            expected: format!("an index below {}", categories.len()),
                        });
                    }
                },
                other => {
                    return Err(ModelError::InvalidValue {
                        column: self.name.clone(),
                        kind: self.data_type().to_string(),
                        value: format!("{other:?}"),
                        expected: "a cast category index".to_string(),
                    });
                }
            };
            renamed_values.push(renamed);
        }

        let kind = match &self.kind {
            ColumnKind::Ordinal { null_policy, .. } => ColumnKind::Ordinal {
                categories: renamed_categories,
                null_policy: null_policy.clone(),
            },
            ColumnKind::Categorical { null_policy, .. } => ColumnKind::Categorical {
                categories: renamed_categories,
                null_policy: null_policy.clone(),
            },
            _ => return Err(self.unsupported("category rename")),
        };

        Ok(CategoryRename {
            column: Self::new(self.name.clone(), self.description.clone(), kind),
            values: renamed_values,
        })
    }

    /// Renames the categories that have an entry in `mapping`, keeping the
    /// others as they are.
    pub fn map_categories(&self, mapping: &BTreeMap<String, String>) -> Result<Self> {
        let relabel = |categories: &[String]| -> Vec<String> {
            categories
                .iter()
                .map(|category| mapping.get(category).unwrap_or(category).clone())
                .collect()
        };
        let kind = match &self.kind {
            ColumnKind::Categorical {
                categories,
                null_policy,
            } => ColumnKind::Categorical {
                categories: relabel(categories),
                null_policy: null_policy.clone(),
            },
            ColumnKind::Ordinal {
                categories,
                null_policy,
            } => ColumnKind::Ordinal {
                categories: relabel(categories),
                null_policy: null_policy.clone(),
            },
            _ => return Err(self.unsupported("category rename")),
        };
        Ok(Self::new(self.name.clone(), self.description.clone(), kind))
    }

    /// Parses temporal values and extracts one calendar field per row.
    pub fn project_unit(&self, values: &[RawValue], unit: TimeUnit) -> Result<Vec<i64>> {
        if !matches!(self.kind, ColumnKind::Temporal) {
            return Err(self.unsupported("time unit projection"));
        }
        values
            .iter()
            .map(|value| {
                parse_timestamp(value)
                    .map(|timestamp| unit.project(&timestamp))
                    .ok_or_else(|| self.invalid_value(value))
            })
            .collect()
    }

    fn conforms(&self, value: &RawValue) -> bool {
        match &self.kind {
            ColumnKind::Boolean { .. } => match value {
                RawValue::Text(text) => BOOLEAN_TEXT_LITERALS.contains(&text.as_str()),
                RawValue::Bool(_) => true,
                RawValue::Int(number) => *number == 0 || *number == 1,
                RawValue::Float(number) => *number == 0.0 || *number == 1.0,
                _ => false,
            },
            ColumnKind::Continuous { .. } => value.to_f64().is_some(),
            ColumnKind::Categorical { categories, .. } | ColumnKind::Ordinal { categories, .. } => {
                value
                    .as_text()
                    .is_some_and(|text| categories.iter().any(|c| c == text))
            }
            ColumnKind::FreeText { .. } => matches!(value, RawValue::Text(_)),
            ColumnKind::Identifier | ColumnKind::Biospecimen => {
                matches!(value, RawValue::Text(_) | RawValue::Int(_))
            }
            ColumnKind::Temporal => parse_timestamp(value).is_some(),
            ColumnKind::Spatial1d | ColumnKind::Spatial2d | ColumnKind::Spatial3d => self
                .spatial_components(value)
                .is_some_and(|axes| axes.iter().all(|axis| axis.to_f64().is_some())),
        }
    }

    /// Converts a value already known to conform.
    fn convert(&self, value: &RawValue) -> CastValue {
        match &self.kind {
            ColumnKind::Boolean { .. } => CastValue::Bool(match value {
                RawValue::Text(text) => BOOLEAN_TRUE_TEXT.contains(&text.as_str()),
                RawValue::Bool(flag) => *flag,
                RawValue::Int(number) => *number == 1,
                RawValue::Float(number) => *number == 1.0,
                _ => false,
            }),
            ColumnKind::Continuous { .. } => value.to_f64().map_or(CastValue::Null, CastValue::Float),
            ColumnKind::Categorical { categories, .. } | ColumnKind::Ordinal { categories, .. } => {
                value
                    .as_text()
                    .and_then(|text| categories.iter().position(|c| c == text))
                    .map_or(CastValue::Null, CastValue::Index)
            }
            ColumnKind::FreeText { .. } => value
                .as_text()
                .map_or(CastValue::Null, |text| CastValue::Text(text.to_string())),
            ColumnKind::Identifier | ColumnKind::Biospecimen => match value {
                RawValue::Int(number) => CastValue::Int(*number),
                other => CastValue::Text(other.to_string()),
            },
            ColumnKind::Temporal => match value.to_f64() {
                Some(seconds) => CastValue::Float(seconds),
                None => parse_timestamp(value).map_or(CastValue::Null, |timestamp| {
                    CastValue::Float(
                        timestamp.timestamp() as f64
                            + f64::from(timestamp.timestamp_subsec_nanos()) / 1e9,
                    )
                }),
            },
            ColumnKind::Spatial1d | ColumnKind::Spatial2d | ColumnKind::Spatial3d => self
                .spatial_components(value)
                .map_or(CastValue::Null, |axes| {
                    CastValue::Point(axes.iter().filter_map(RawValue::to_f64).collect())
                }),
        }
    }

    fn validate_spatial(&self, values: &[RawValue]) -> Result<()> {
        let Some(axes) = self.data_type().spatial_axes() else {
            return Ok(());
        };
        let mut decomposed: Vec<&[RawValue]> = Vec::with_capacity(values.len());
        for value in values {
            match self.spatial_components(value) {
                Some(components) => decomposed.push(components),
                None => return Err(self.invalid_value(value)),
            }
        }
        for axis in 0..axes {
            if decomposed
                .iter()
                .any(|components| components[axis].to_f64().is_none())
            {
                return Err(self.invalid_values(format!("real numbers on axis {}", axis + 1)));
            }
        }
        Ok(())
    }

    /// Splits a spatial value into its axes. A bare scalar counts as a 1-tuple.
    fn spatial_components<'a>(&self, value: &'a RawValue) -> Option<&'a [RawValue]> {
        let axes = self.data_type().spatial_axes()?;
        match value {
            RawValue::Tuple(components) if components.len() == axes => Some(components.as_slice()),
            RawValue::Tuple(_) | RawValue::Missing => None,
            scalar if axes == 1 => Some(std::slice::from_ref(scalar)),
            _ => None,
        }
    }

    fn expected(&self) -> String {
        match &self.kind {
            ColumnKind::Boolean { .. } => {
                "one of \"True\", \"False\", \"Yes\", \"No\", \"0\", \"1\", a boolean, or the numbers 0 and 1".to_string()
            }
            ColumnKind::Continuous { .. } => "a real number".to_string(),
            ColumnKind::Categorical { categories, .. } | ColumnKind::Ordinal { categories, .. } => {
                format!("one of [{}]", categories.join(", "))
            }
            ColumnKind::FreeText { .. } => "text".to_string(),
            ColumnKind::Identifier | ColumnKind::Biospecimen => {
                "a string or an integer".to_string()
            }
            ColumnKind::Temporal => {
                "a timestamp (epoch seconds or an ISO 8601 date/time)".to_string()
            }
            ColumnKind::Spatial1d | ColumnKind::Spatial2d | ColumnKind::Spatial3d => {
                let axes = self.data_type().spatial_axes().unwrap_or(1);
                format!("a {axes}-tuple of real numbers")
            }
        }
    }

    fn invalid_value(&self, value: &RawValue) -> ModelError {
        ModelError::InvalidValue {
            column: self.name.clone(),
            kind: self.data_type().to_string(),
            value: value.to_string(),
            expected: self.expected(),
        }
    }

    fn invalid_values(&self, expected: String) -> ModelError {
        ModelError::InvalidValues {
            column: self.name.clone(),
            kind: self.data_type().to_string(),
            expected,
        }
    }

    fn unsupported(&self, operation: &'static str) -> ModelError {
        ModelError::Unsupported {
            column: self.name.clone(),
            kind: self.data_type().to_string(),
            operation,
        }
    }
}
