//! Column alignment engine.
//!
//! For every column of a source table the aligner picks the closest column of
//! a target table under one of three distances:
//!
//! - `value`: how alike the two columns' cast values are (see [`crate::distance`])
//! - `description`: cosine distance between embedded column descriptions
//! - `name`: `1 - Jaro-Winkler` similarity of the normalized column names
//!
//! Matching is one-directional and not a bijection: several source columns
//! may pick the same target, and targets may stay unmatched.

use std::fmt;
use std::str::FromStr;

use dynomics_table::MetadataTable;
use serde::Serialize;
use tracing::{debug, warn};

use crate::distance::ValueProfile;
use crate::embed::Embedder;
use crate::error::{AlignError, Result};
use crate::matrix::DistanceMatrix;
use crate::utils::name_distance;

/// Distance assigned to a description pair that could not be embedded or compared.
pub const MAX_DESCRIPTION_DISTANCE: f64 = 2.0;

/// Which distance drives the matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Value,
    Description,
    Name,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Value => "value",
            MatchMode::Description => "description",
            MatchMode::Name => "name",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = AlignError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" => Ok(MatchMode::Value),
            "description" => Ok(MatchMode::Description),
            "name" => Ok(MatchMode::Name),
            _ => Err(AlignError::UnknownMode {
                mode: s.to_string(),
            }),
        }
    }
}

/// Tuning for [`ColumnAligner`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlignmentOptions {
    /// When set, a best candidate at or above this distance is reported as
    /// no match (default: unset, every source column gets its nearest target).
    pub max_distance: Option<f64>,
}

impl AlignmentOptions {
    /// Only accepts close candidates.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_distance: Some(0.2),
        }
    }

    /// Accepts loose candidates, rejecting only clearly unrelated ones.
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            max_distance: Some(0.6),
        }
    }

    #[must_use]
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    fn accepts(&self, distance: f64) -> bool {
        self.max_distance.is_none_or(|max| distance < max)
    }
}

/// The chosen target for one source column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMatch {
    pub target: String,
    pub distance: f64,
}

/// One source column and its match, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEntry {
    pub source: String,
    pub best: Option<ColumnMatch>,
}

/// Source columns, in source table order, with their best targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMatching {
    pub mode: MatchMode,
    pub entries: Vec<MatchEntry>,
}

impl ColumnMatching {
    /// The match for `source`; `None` if the column is unknown or unmatched.
    pub fn get(&self, source: &str) -> Option<&ColumnMatch> {
        self.entries
            .iter()
            .find(|entry| entry.source == source)
            .and_then(|entry| entry.best.as_ref())
    }

    /// Target name for `source`, if matched.
    pub fn target(&self, source: &str) -> Option<&str> {
        self.get(source).map(|m| m.target.as_str())
    }

    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.best.is_some())
            .count()
    }

    /// Source columns without a match.
    pub fn unmatched(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.best.is_none())
            .map(|entry| entry.source.as_str())
            .collect()
    }
}

/// A matching together with all the distance matrices behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    pub matching: ColumnMatching,
    pub value_distances: DistanceMatrix,
    pub description_distances: DistanceMatrix,
    pub name_distances: DistanceMatrix,
}

/// Aligns the columns of a source table with those of a target table.
///
/// # Example
///
/// ```ignore
/// use dynomics_align::{ColumnAligner, MatchMode, TrigramEmbedder};
///
/// let aligner = ColumnAligner::new(TrigramEmbedder::default());
/// let matching = aligner.nearest_column_matching(&source, &target, MatchMode::Description)?;
/// ```
#[derive(Debug, Clone)]
pub struct ColumnAligner<E> {
    embedder: E,
    options: AlignmentOptions,
}

impl<E: Embedder> ColumnAligner<E> {
    pub fn new(embedder: E) -> Self {
        Self::with_options(embedder, AlignmentOptions::default())
    }

    pub fn with_options(embedder: E, options: AlignmentOptions) -> Self {
        Self { embedder, options }
    }

    pub fn options(&self) -> &AlignmentOptions {
        &self.options
    }

    /// Value distance between every source and target column.
    ///
    /// Fails only if a column cannot be cast, which a constructed table rules out.
    pub fn value_distances(
        &self,
        source: &MetadataTable,
        target: &MetadataTable,
    ) -> Result<DistanceMatrix> {
        value_distance_matrix(source, target)
    }

    /// Description distance between every source and target column.
    ///
    /// Each table's descriptions are embedded once. Pairs whose embedding or
    /// comparison fails get [`MAX_DESCRIPTION_DISTANCE`].
    pub fn description_distances(
        &self,
        source: &MetadataTable,
        target: &MetadataTable,
    ) -> DistanceMatrix {
        let source_vectors = self.embed_descriptions(source);
        let target_vectors = self.embed_descriptions(target);
        DistanceMatrix::from_fn(source.column_names(), target.column_names(), |row, col| {
            let (Some(left), Some(right)) = (&source_vectors[row], &target_vectors[col]) else {
                return MAX_DESCRIPTION_DISTANCE;
            };
            match self.embedder.distance(left, right) {
                Ok(distance) => distance,
                Err(error) => {
                    debug!(%error, "Description distance failed");
                    MAX_DESCRIPTION_DISTANCE
                }
            }
        })
    }

    /// Name distance between every source and target column.
    pub fn name_distances(&self, source: &MetadataTable, target: &MetadataTable) -> DistanceMatrix {
        let source_names = source.column_names();
        let target_names = target.column_names();
        let distances: Vec<Vec<f64>> = source_names
            .iter()
            .map(|s| target_names.iter().map(|t| name_distance(s, t)).collect())
            .collect();
        DistanceMatrix::from_fn(source_names, target_names, |row, col| distances[row][col])
    }

    /// Picks, for each source column, the nearest target column under `mode`.
    ///
    /// An empty target table yields no match for every source column.
    pub fn nearest_column_matching(
        &self,
        source: &MetadataTable,
        target: &MetadataTable,
        mode: MatchMode,
    ) -> Result<ColumnMatching> {
        let distances = match mode {
            MatchMode::Value => self.value_distances(source, target)?,
            MatchMode::Description => self.description_distances(source, target),
            MatchMode::Name => self.name_distances(source, target),
        };
        Ok(self.match_from(&distances, mode))
    }

    /// Computes all three distance matrices and the matching under `mode`.
    pub fn align(
        &self,
        source: &MetadataTable,
        target: &MetadataTable,
        mode: MatchMode,
    ) -> Result<Alignment> {
        let value_distances = self.value_distances(source, target)?;
        let description_distances = self.description_distances(source, target);
        let name_distances = self.name_distances(source, target);
        let matching = self.match_from(
            match mode {
                MatchMode::Value => &value_distances,
                MatchMode::Description => &description_distances,
                MatchMode::Name => &name_distances,
            },
            mode,
        );
        Ok(Alignment {
            matching,
            value_distances,
            description_distances,
            name_distances,
        })
    }

    fn match_from(&self, distances: &DistanceMatrix, mode: MatchMode) -> ColumnMatching {
        let entries: Vec<MatchEntry> = distances
            .sources()
            .iter()
            .map(|source| MatchEntry {
                source: source.clone(),
                best: distances
                    .nearest(source)
                    .filter(|(_, distance)| self.options.accepts(*distance))
                    .map(|(target, distance)| ColumnMatch {
                        target: target.to_string(),
                        distance,
                    }),
            })
            .collect();
        let matching = ColumnMatching { mode, entries };
        debug!(
            mode = %mode,
            sources = distances.sources().len(),
            targets = distances.targets().len(),
            matched = matching.matched_count(),
            "Computed column matching"
        );
        matching
    }

    /// One embedding per column, `None` where embedding failed.
    fn embed_descriptions(&self, table: &MetadataTable) -> Vec<Option<Vec<f32>>> {
        let texts: Vec<&str> = table
            .column_types()
            .map(|column| column.description.as_str())
            .collect();
        if texts.is_empty() {
            return Vec::new();
        }

        match self.embedder.embed_many(&texts) {
            Ok(vectors) if vectors.len() == texts.len() => vectors.into_iter().map(Some).collect(),
            Ok(vectors) => {
                warn!(
                    expected = texts.len(),
                    actual = vectors.len(),
                    "Batch embedding returned the wrong number of vectors; embedding one by one"
                );
                self.embed_each(&texts)
            }
            Err(error) => {
                warn!(%error, "Batch embedding failed; embedding one by one");
                self.embed_each(&texts)
            }
        }
    }

    fn embed_each(&self, texts: &[&str]) -> Vec<Option<Vec<f32>>> {
        texts
            .iter()
            .map(|text| match self.embedder.embed(text) {
                Ok(vector) => Some(vector),
                Err(error) => {
                    warn!(%error, description = *text, "Description embedding failed");
                    None
                }
            })
            .collect()
    }
}

fn value_distance_matrix(source: &MetadataTable, target: &MetadataTable) -> Result<DistanceMatrix> {
    let source_profiles = value_profiles(source)?;
    let target_profiles = value_profiles(target)?;
    Ok(DistanceMatrix::from_fn(
        source.column_names(),
        target.column_names(),
        |row, col| source_profiles[row].distance(&target_profiles[col]),
    ))
}

fn value_profiles(table: &MetadataTable) -> Result<Vec<ValueProfile>> {
    table
        .column_types()
        .map(|column| {
            let values = table.cast_column(&column.name)?;
            Ok(ValueProfile::new(column, &values))
        })
        .collect()
}

/// Alignment operations on a metadata table.
///
/// The table is the source; `other` is the target.
pub trait TableAlignment {
    fn column_value_distance(&self, other: &MetadataTable) -> Result<DistanceMatrix>;

    fn column_semantic_distance<E: Embedder>(
        &self,
        other: &MetadataTable,
        embedder: &E,
    ) -> DistanceMatrix;

    fn nearest_column_matching<E: Embedder>(
        &self,
        other: &MetadataTable,
        embedder: &E,
        mode: MatchMode,
    ) -> Result<ColumnMatching>;
}

impl TableAlignment for MetadataTable {
    fn column_value_distance(&self, other: &MetadataTable) -> Result<DistanceMatrix> {
        value_distance_matrix(self, other)
    }

    fn column_semantic_distance<E: Embedder>(
        &self,
        other: &MetadataTable,
        embedder: &E,
    ) -> DistanceMatrix {
        ColumnAligner::new(embedder).description_distances(self, other)
    }

    fn nearest_column_matching<E: Embedder>(
        &self,
        other: &MetadataTable,
        embedder: &E,
        mode: MatchMode,
    ) -> Result<ColumnMatching> {
        ColumnAligner::new(embedder).nearest_column_matching(self, other, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_mode_from_str() {
        assert_eq!("Value".parse::<MatchMode>().unwrap(), MatchMode::Value);
        assert_eq!(" description ".parse::<MatchMode>().unwrap(), MatchMode::Description);
        assert!(matches!(
            "semantic".parse::<MatchMode>(),
            Err(AlignError::UnknownMode { .. })
        ));
    }

    #[test]
    fn test_options_threshold() {
        assert!(AlignmentOptions::default().accepts(10.0));
        assert!(AlignmentOptions::strict().accepts(0.1));
        assert!(!AlignmentOptions::strict().accepts(0.2));
        assert!(AlignmentOptions::relaxed().accepts(0.5));
    }
}
