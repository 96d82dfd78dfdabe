//! Integration tests for column alignment.

use std::cell::Cell;

use dynomics_align::{
    AlignmentOptions, ColumnAligner, Embedder, EmbeddingError, MAX_DESCRIPTION_DISTANCE,
    MAX_VALUE_DISTANCE, MatchMode, TableAlignment, TrigramEmbedder,
};
use dynomics_model::{ColumnType, DataDictionary, NullPolicy};
use dynomics_table::MetadataTable;
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

fn test_df(columns: Vec<(&str, Vec<&str>)>) -> DataFrame {
    let cols: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| {
            Series::new(
                name.into(),
                values.iter().copied().map(String::from).collect::<Vec<_>>(),
            )
            .into_column()
        })
        .collect();
    DataFrame::new(cols).unwrap()
}

/// A table of free-text columns with the given descriptions and one row of data.
fn described_table(columns: &[(&str, &str)]) -> MetadataTable {
    let df = test_df(columns.iter().map(|(name, _)| (*name, vec!["x"])).collect());
    let dictionary = columns
        .iter()
        .map(|(name, description)| {
            ColumnType::free_text(*name, *description, NullPolicy::default())
        })
        .collect::<DataDictionary>();
    MetadataTable::new(df, dictionary).unwrap()
}

fn empty_table() -> MetadataTable {
    MetadataTable::new(DataFrame::empty(), DataDictionary::new()).unwrap()
}

fn source_table() -> MetadataTable {
    let df = test_df(vec![
        ("sex", vec!["M", "F", "M"]),
        ("age", vec!["30", "40", "not_collected"]),
    ]);
    let dictionary = DataDictionary::new()
        .with_column(ColumnType::categorical(
            "sex",
            "Sex of the host",
            ["M", "F"],
            NullPolicy::default(),
        ))
        .with_column(ColumnType::continuous(
            "age",
            "Age of the host in years",
            "years",
            NullPolicy::default(),
        ));
    MetadataTable::new(df, dictionary).unwrap()
}

fn target_table() -> MetadataTable {
    let df = test_df(vec![
        ("subject", vec!["a1", "a2"]),
        ("years", vec!["40", "30"]),
        ("gender", vec!["F", "M"]),
    ]);
    let dictionary = DataDictionary::new()
        .with_column(ColumnType::identifier("subject", "Subject identifier"))
        .with_column(ColumnType::continuous(
            "years",
            "Host age in years",
            "years",
            NullPolicy::default(),
        ))
        .with_column(ColumnType::categorical(
            "gender",
            "Host gender",
            ["M", "F"],
            NullPolicy::default(),
        ));
    MetadataTable::new(df, dictionary).unwrap()
}

/// Fails on one specific description, both in batches and one by one.
struct FailingEmbedder {
    broken: &'static str,
}

impl Embedder for FailingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text == self.broken {
            return Err(EmbeddingError::service("timeout"));
        }
        TrigramEmbedder::default().embed(text)
    }
}

/// Returns a short batch, forcing the per-description fallback.
struct ShortBatchEmbedder;

impl Embedder for ShortBatchEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        TrigramEmbedder::default().embed(text)
    }

    fn embed_many(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct CountingEmbedder {
    batches: Cell<usize>,
    singles: Cell<usize>,
}

impl Embedder for CountingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.singles.set(self.singles.get() + 1);
        TrigramEmbedder::default().embed(text)
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batches.set(self.batches.get() + 1);
        let inner = TrigramEmbedder::default();
        texts.iter().map(|text| inner.embed(text)).collect()
    }
}

#[test]
fn identical_descriptions_match_themselves() {
    let source = described_table(&[("host_age", "Age of the host in years")]);
    let target = described_table(&[("age", "Age of the host in years")]);

    let aligner = ColumnAligner::new(TrigramEmbedder::default());
    let matching = aligner
        .nearest_column_matching(&source, &target, MatchMode::Description)
        .unwrap();

    let best = matching.get("host_age").unwrap();
    assert_eq!(best.target, "age");
    assert!(best.distance.abs() < 1e-9, "distance {}", best.distance);
}

#[test]
fn empty_target_yields_no_matches() {
    let source = source_table();
    let aligner = ColumnAligner::new(TrigramEmbedder::default());

    for mode in [MatchMode::Value, MatchMode::Description, MatchMode::Name] {
        let matching = aligner
            .nearest_column_matching(&source, &empty_table(), mode)
            .unwrap();
        assert_eq!(matching.entries.len(), 2);
        assert_eq!(matching.matched_count(), 0);
        assert_eq!(matching.unmatched(), ["sex", "age"]);
    }
}

#[test]
fn value_mode_pairs_compatible_columns() {
    let aligner = ColumnAligner::new(TrigramEmbedder::default());
    let alignment = aligner
        .align(&source_table(), &target_table(), MatchMode::Value)
        .unwrap();

    assert_eq!(alignment.matching.target("sex"), Some("gender"));
    assert_eq!(alignment.matching.target("age"), Some("years"));

    let values = &alignment.value_distances;
    assert_eq!(values.get("sex", "gender"), Some(0.0));
    assert_eq!(values.get("age", "years"), Some(0.0));
    assert_eq!(values.get("sex", "years"), Some(MAX_VALUE_DISTANCE));
    assert_eq!(values.get("age", "subject"), Some(MAX_VALUE_DISTANCE));
}

#[test]
fn failed_embedding_only_affects_its_pairs() {
    let source = described_table(&[("a", "Age of the host"), ("b", "BROKEN")]);
    let target = described_table(&[("x", "Age of the host"), ("y", "Body site")]);

    let aligner = ColumnAligner::new(FailingEmbedder { broken: "BROKEN" });
    let distances = aligner.description_distances(&source, &target);

    assert!(distances.get("a", "x").unwrap() < 1e-9);
    assert!(distances.get("a", "y").unwrap() < MAX_DESCRIPTION_DISTANCE);
    assert_eq!(
        distances.row("b"),
        Some([MAX_DESCRIPTION_DISTANCE, MAX_DESCRIPTION_DISTANCE].as_slice())
    );

    // Every candidate is maximal for "b": the tie goes to the smallest name.
    let matching = aligner
        .nearest_column_matching(&source, &target, MatchMode::Description)
        .unwrap();
    assert_eq!(matching.target("a"), Some("x"));
    assert_eq!(matching.target("b"), Some("x"));
}

#[test]
fn short_batch_falls_back_to_single_embeddings() {
    let source = described_table(&[("a", "Sampling depth in metres")]);
    let target = described_table(&[("b", "Sampling depth in metres")]);

    let distances = ColumnAligner::new(ShortBatchEmbedder).description_distances(&source, &target);
    assert!(distances.get("a", "b").unwrap() < 1e-9);
}

#[test]
fn descriptions_are_embedded_once_per_table() {
    let source = described_table(&[("a", "one"), ("b", "two"), ("c", "three")]);
    let target = described_table(&[("x", "one"), ("y", "two")]);
    let embedder = CountingEmbedder::default();

    let distances = source.column_semantic_distance(&target, &embedder);
    assert_eq!(distances.sources().len(), 3);
    assert_eq!(distances.targets().len(), 2);
    assert_eq!(embedder.batches.get(), 2);
    assert_eq!(embedder.singles.get(), 0);
}

#[test]
fn ties_prefer_smallest_target_name() {
    let source = described_table(&[("site", "Body site")]);
    let target = described_table(&[("zone", "Body site"), ("area", "Body site")]);

    let matching = source
        .nearest_column_matching(&target, &TrigramEmbedder::default(), MatchMode::Description)
        .unwrap();
    assert_eq!(matching.target("site"), Some("area"));
}

#[test]
fn max_distance_rejects_weak_candidates() {
    let source = described_table(&[("age", "Age of the host in years"), ("ph", "Soil acidity")]);
    let target = described_table(&[("host_age", "Age of the host in years")]);

    let aligner = ColumnAligner::with_options(
        TrigramEmbedder::default(),
        AlignmentOptions::default().with_max_distance(0.5),
    );
    let matching = aligner
        .nearest_column_matching(&source, &target, MatchMode::Description)
        .unwrap();
    assert_eq!(matching.target("age"), Some("host_age"));
    assert_eq!(matching.target("ph"), None);
    assert_eq!(matching.unmatched(), ["ph"]);
}

#[test]
fn name_mode_uses_fuzzy_names() {
    let source = described_table(&[("Host_Age", "a"), ("body_site", "b")]);
    let target = described_table(&[("host age", "c"), ("bodysite", "d"), ("ph", "e")]);

    let matching = ColumnAligner::new(TrigramEmbedder::default())
        .nearest_column_matching(&source, &target, MatchMode::Name)
        .unwrap();
    assert_eq!(matching.target("Host_Age"), Some("host age"));
    assert_eq!(matching.get("Host_Age").unwrap().distance, 0.0);
    assert_eq!(matching.target("body_site"), Some("bodysite"));
}

#[test]
fn value_distance_through_table_trait() {
    let distances = source_table()
        .column_value_distance(&target_table())
        .unwrap();
    assert_eq!(distances.sources(), ["sex", "age"]);
    assert_eq!(distances.targets(), ["subject", "years", "gender"]);
}

#[test]
fn alignment_report_serializes() {
    let alignment = ColumnAligner::new(TrigramEmbedder::default())
        .align(&source_table(), &target_table(), MatchMode::Value)
        .unwrap();

    let json = serde_json::to_value(&alignment).unwrap();
    assert_eq!(json["matching"]["mode"], "value");
    assert_eq!(json["matching"]["entries"][0]["source"], "sex");
    assert_eq!(json["matching"]["entries"][0]["best"]["target"], "gender");
    assert_eq!(json["value_distances"]["targets"][2], "gender");
    assert_eq!(
        json["value_distances"]["distances"].as_array().map(Vec::len),
        Some(6)
    );
}
