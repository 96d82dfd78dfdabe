//! Polars AnyValue conversions.
//!
//! Cells are read into [`RawValue`] without interpretation: strings stay text,
//! numeric types keep their numeric form, list and array cells become tuples.

use dynomics_model::RawValue;
use polars::prelude::*;

/// Converts a Polars `AnyValue` to a [`RawValue`].
///
/// `Null` becomes [`RawValue::Missing`]. Dtypes without a direct counterpart
/// (dates, datetimes, durations) fall back to their display form, which for
/// temporal dtypes is an ISO 8601 string.
///
/// # Examples
///
/// ```
/// use dynomics_common::any_to_raw;
/// use dynomics_model::RawValue;
/// use polars::prelude::AnyValue;
///
/// assert_eq!(any_to_raw(AnyValue::Null), RawValue::Missing);
/// assert_eq!(any_to_raw(AnyValue::Int32(42)), RawValue::Int(42));
/// assert_eq!(any_to_raw(AnyValue::String("gut")), RawValue::text("gut"));
/// ```
pub fn any_to_raw(value: AnyValue<'_>) -> RawValue {
    match value {
        AnyValue::Null => RawValue::Missing,
        AnyValue::Boolean(b) => RawValue::Bool(b),
        AnyValue::Int8(v) => RawValue::Int(i64::from(v)),
        AnyValue::Int16(v) => RawValue::Int(i64::from(v)),
        AnyValue::Int32(v) => RawValue::Int(i64::from(v)),
        AnyValue::Int64(v) => RawValue::Int(v),
        AnyValue::UInt8(v) => RawValue::Int(i64::from(v)),
        AnyValue::UInt16(v) => RawValue::Int(i64::from(v)),
        AnyValue::UInt32(v) => RawValue::Int(i64::from(v)),
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(v) => RawValue::Int(v),
            Err(_) => RawValue::Float(v as f64),
        },
        AnyValue::Float32(v) => RawValue::Float(f64::from(v)),
        AnyValue::Float64(v) => RawValue::Float(v),
        AnyValue::String(s) => RawValue::text(s),
        AnyValue::StringOwned(s) => RawValue::text(s.as_str()),
        AnyValue::List(series) => RawValue::Tuple(series_raw_values(&series)),
        AnyValue::Array(series, _) => RawValue::Tuple(series_raw_values(&series)),
        other => RawValue::Text(other.to_string()),
    }
}

/// Reads every cell of a column, in row order.
pub fn column_raw_values(column: &Column) -> Vec<RawValue> {
    (0..column.len())
        .map(|idx| any_to_raw(column.get(idx).unwrap_or(AnyValue::Null)))
        .collect()
}

fn series_raw_values(series: &Series) -> Vec<RawValue> {
    (0..series.len())
        .map(|idx| any_to_raw(series.get(idx).unwrap_or(AnyValue::Null)))
        .collect()
}

/// Builds a string column; `None` cells become nulls.
pub fn text_column(name: &str, values: Vec<Option<String>>) -> Column {
    Column::new(name.into(), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_raw_scalars() {
        assert_eq!(any_to_raw(AnyValue::Boolean(true)), RawValue::Bool(true));
        assert_eq!(any_to_raw(AnyValue::UInt32(7)), RawValue::Int(7));
        assert_eq!(any_to_raw(AnyValue::Float64(1.5)), RawValue::Float(1.5));
        assert_eq!(
            any_to_raw(AnyValue::UInt64(u64::MAX)),
            RawValue::Float(u64::MAX as f64)
        );
    }

    #[test]
    fn test_any_to_raw_list() {
        let series = Series::new("p".into(), &[1.0f64, 2.5]);
        assert_eq!(
            any_to_raw(AnyValue::List(series)),
            RawValue::point(&[1.0, 2.5])
        );
    }

    #[test]
    fn test_column_raw_values_keeps_nulls() {
        let column = Column::new("c".into(), &[Some("a"), None, Some("b")]);
        assert_eq!(
            column_raw_values(&column),
            vec![RawValue::text("a"), RawValue::Missing, RawValue::text("b")]
        );
    }

    #[test]
    fn test_text_column() {
        let column = text_column("site", vec![Some("gut".to_string()), None]);
        assert_eq!(column.name().as_str(), "site");
        assert_eq!(column.null_count(), 1);
        assert_eq!(column.dtype(), &DataType::String);
    }
}
