//! Distances between the cast value distributions of two columns.
//!
//! | Column kinds | Distance |
//! |--------------|----------|
//! | Boolean, Categorical/Ordinal, FreeText, Identifier, Biospecimen | `1 - Jaccard` of the non-null labels |
//! | Continuous, Temporal | two-sample Kolmogorov-Smirnov statistic |
//! | Spatial (same dimension) | mean per-axis KS statistic |
//!
//! Columns of different kinds, and columns without non-null values, are not
//! comparable and get [`MAX_VALUE_DISTANCE`].

use std::collections::BTreeSet;

use dynomics_model::{CastValue, ColumnKind, ColumnType};

/// Distance assigned to non-comparable column pairs.
pub const MAX_VALUE_DISTANCE: f64 = 1.0;

/// Which columns can be compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueClass {
    Boolean,
    Categorical,
    FreeText,
    Identifier,
    Biospecimen,
    Continuous,
    Temporal,
    Spatial(usize),
}

#[derive(Debug, Clone)]
enum Sample {
    Labels(BTreeSet<String>),
    Numbers(Vec<f64>),
    Points(Vec<Vec<f64>>),
}

/// The non-null cast values of one column, reduced to what the distance needs.
#[derive(Debug, Clone)]
pub struct ValueProfile {
    class: ValueClass,
    sample: Sample,
}

impl ValueProfile {
    /// Builds a profile from a column and its cast values.
    pub fn new(column: &ColumnType, values: &[CastValue]) -> Self {
        let non_null = values.iter().filter(|value| !value.is_null());
        match &column.kind {
            ColumnKind::Boolean { .. } => Self::labels(
                ValueClass::Boolean,
                non_null.filter_map(|value| value.as_bool().map(|b| b.to_string())),
            ),
            ColumnKind::Categorical { categories, .. } | ColumnKind::Ordinal { categories, .. } => {
                Self::labels(
                    ValueClass::Categorical,
                    non_null.filter_map(|value| match value {
                        CastValue::Index(index) => categories.get(*index).cloned(),
                        CastValue::Text(text) => Some(text.clone()),
                        _ => None,
                    }),
                )
            }
            ColumnKind::FreeText { .. } => {
                Self::labels(ValueClass::FreeText, non_null.filter_map(label))
            }
            ColumnKind::Identifier => {
                Self::labels(ValueClass::Identifier, non_null.filter_map(label))
            }
            ColumnKind::Biospecimen => {
                Self::labels(ValueClass::Biospecimen, non_null.filter_map(label))
            }
            ColumnKind::Continuous { .. } => {
                Self::numbers(ValueClass::Continuous, non_null.filter_map(CastValue::as_f64))
            }
            ColumnKind::Temporal => {
                Self::numbers(ValueClass::Temporal, non_null.filter_map(CastValue::as_f64))
            }
            ColumnKind::Spatial1d => Self::points(1, non_null),
            ColumnKind::Spatial2d => Self::points(2, non_null),
            ColumnKind::Spatial3d => Self::points(3, non_null),
        }
    }

    /// True when the column has no non-null values.
    pub fn is_empty(&self) -> bool {
        match &self.sample {
            Sample::Labels(labels) => labels.is_empty(),
            Sample::Numbers(numbers) => numbers.is_empty(),
            Sample::Points(axes) => axes.iter().all(Vec::is_empty),
        }
    }

    /// Distance to another profile, in `[0, 1]`.
    pub fn distance(&self, other: &ValueProfile) -> f64 {
        if self.class != other.class || self.is_empty() || other.is_empty() {
            return MAX_VALUE_DISTANCE;
        }
        let distance = match (&self.sample, &other.sample) {
            (Sample::Labels(left), Sample::Labels(right)) => jaccard_distance(left, right),
            (Sample::Numbers(left), Sample::Numbers(right)) => ks_statistic(left, right),
            (Sample::Points(left), Sample::Points(right)) => {
                let per_axis: Option<Vec<f64>> = left
                    .iter()
                    .zip(right)
                    .map(|(l, r)| ks_statistic(l, r))
                    .collect();
                per_axis.map(|stats| stats.iter().sum::<f64>() / stats.len() as f64)
            }
            _ => None,
        };
        distance.unwrap_or(MAX_VALUE_DISTANCE)
    }

    fn labels(class: ValueClass, labels: impl Iterator<Item = String>) -> Self {
        Self {
            class,
            sample: Sample::Labels(labels.collect()),
        }
    }

    fn numbers(class: ValueClass, numbers: impl Iterator<Item = f64>) -> Self {
        let mut numbers: Vec<f64> = numbers.filter(|n| !n.is_nan()).collect();
        numbers.sort_by(f64::total_cmp);
        Self {
            class,
            sample: Sample::Numbers(numbers),
        }
    }

    fn points<'a>(axes: usize, values: impl Iterator<Item = &'a CastValue>) -> Self {
        let mut per_axis = vec![Vec::new(); axes];
        for point in values.filter_map(CastValue::as_point) {
            if point.len() != axes || point.iter().any(|v| v.is_nan()) {
                continue;
            }
            for (axis, value) in per_axis.iter_mut().zip(point) {
                axis.push(*value);
            }
        }
        for axis in &mut per_axis {
            axis.sort_by(f64::total_cmp);
        }
        Self {
            class: ValueClass::Spatial(axes),
            sample: Sample::Points(per_axis),
        }
    }
}

fn label(value: &CastValue) -> Option<String> {
    match value {
        CastValue::Text(text) => Some(text.clone()),
        CastValue::Int(number) => Some(number.to_string()),
        _ => None,
    }
}

/// `1 - |A ∩ B| / |A ∪ B|`; `None` when both sets are empty.
pub fn jaccard_distance(left: &BTreeSet<String>, right: &BTreeSet<String>) -> Option<f64> {
    let union = left.union(right).count();
    if union == 0 {
        return None;
    }
    let intersection = left.intersection(right).count();
    Some(1.0 - intersection as f64 / union as f64)
}

/// Two-sample Kolmogorov-Smirnov statistic: the largest gap between the two
/// empirical distribution functions.
///
/// Both inputs must be sorted ascending. Returns `None` if either is empty.
pub fn ks_statistic(left: &[f64], right: &[f64]) -> Option<f64> {
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let (n, m) = (left.len() as f64, right.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut statistic = 0.0f64;
    while i < left.len() && j < right.len() {
        let x = left[i].min(right[j]);
        while i < left.len() && left[i] <= x {
            i += 1;
        }
        while j < right.len() && right[j] <= x {
            j += 1;
        }
        statistic = statistic.max((i as f64 / n - j as f64 / m).abs());
    }
    Some(statistic)
}
