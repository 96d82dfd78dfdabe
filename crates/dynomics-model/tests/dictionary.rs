//! Tests for data dictionary persistence.

use std::collections::BTreeMap;

use dynomics_model::{ColumnType, DataDictionary, DataType, ModelError, NullPolicy};

fn sample_dictionary() -> DataDictionary {
    DataDictionary::new()
        .with_column(ColumnType::identifier("sample_id", "Sample identifier"))
        .with_column(ColumnType::continuous(
            "host_age",
            "Age of the host at sampling",
            "years",
            NullPolicy::default(),
        ))
        .with_column(ColumnType::categorical(
            "body_site",
            "Body site the sample was taken from",
            ["gut", "skin", "oral"],
            NullPolicy::new(["not_collected", "NA"]),
        ))
        .with_column(ColumnType::spatial_2d("location", "Sampling location"))
}

#[test]
fn yaml_layout_is_stable() {
    let yaml = sample_dictionary().to_yaml_string().unwrap();
    insta::assert_snapshot!(yaml, @r"
    sample_id:
      data_type: Identifier
      description: Sample identifier
    host_age:
      data_type: Continuous
      description: Age of the host at sampling
      unit: years
    body_site:
      data_type: Categorical
      description: Body site the sample was taken from
      categories:
      - gut
      - skin
      - oral
      null_values:
      - not_collected
      - NA
    location:
      data_type: Spatial2d
      description: Sampling location
    ");
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dictionary.yaml");
    let dictionary = sample_dictionary();
    dictionary.save(&path).unwrap();

    let loaded = DataDictionary::load(&path).unwrap();
    assert_eq!(loaded, dictionary);
    assert_eq!(
        loaded.keys().collect::<Vec<_>>(),
        ["sample_id", "host_age", "body_site", "location"]
    );
}

#[test]
fn read_replaces_content() {
    let mut dictionary = sample_dictionary();
    let document = "\
notes:
  data_type: FreeText
  description: Free-form notes
";
    dictionary.read(document.as_bytes()).unwrap();
    assert_eq!(dictionary.len(), 1);
    assert_eq!(
        dictionary.get("notes").map(ColumnType::data_type),
        Some(DataType::FreeText)
    );
    assert!(dictionary.get("notes").unwrap().null_policy().unwrap().is_default());
}

#[test]
fn failed_read_leaves_dictionary_unchanged() {
    let mut dictionary = sample_dictionary();
    let document = "\
weight:
  data_type: Continuous
  description: Body weight
";
    let err = dictionary.read(document.as_bytes()).unwrap_err();
    match err {
        ModelError::Format { message } => {
            assert!(message.contains("weight"));
            assert!(message.contains("unit"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(dictionary, sample_dictionary());
}

#[test]
fn rejects_malformed_records() {
    let cases = [
        // unknown data type
        "a:\n  data_type: Colour\n  description: x\n",
        // categories missing
        "a:\n  data_type: Ordinal\n  description: x\n",
        // null tokens on a type without a null policy
        "a:\n  data_type: Identifier\n  description: x\n  null_values: [NA]\n",
        // unit on a non-continuous column
        "a:\n  data_type: Boolean\n  description: x\n  unit: kg\n",
        // unknown field
        "a:\n  data_type: Boolean\n  description: x\n  colour: red\n",
    ];
    for case in cases {
        let err = DataDictionary::from_yaml_str(case).unwrap_err();
        match err {
            ModelError::Format { message } => assert!(message.contains("column a"), "{message}"),
            other => panic!("unexpected error for {case:?}: {other:?}"),
        }
    }

    assert!(matches!(
        DataDictionary::from_yaml_str("- a\n- b\n"),
        Err(ModelError::Format { .. })
    ));
}

#[test]
fn broken_yaml_is_a_format_error() {
    let document = "a: [unclosed\n  data_type: Boolean\n";
    assert!(matches!(
        DataDictionary::from_yaml_str(document),
        Err(ModelError::Format { .. })
    ));

    let mut dictionary = sample_dictionary();
    let err = dictionary.read(document.as_bytes()).unwrap_err();
    assert!(matches!(err, ModelError::Format { .. }), "{err:?}");
    assert_eq!(dictionary, sample_dictionary());
}

#[test]
fn duplicate_categories_are_accepted() {
    let document = "\
colour:
  data_type: Categorical
  description: Colony colour
  categories: [red, blue, red]
";
    let dictionary = DataDictionary::from_yaml_str(document).unwrap();
    let column = dictionary.get("colour").unwrap();
    let cast = column.cast(&[dynomics_model::RawValue::text("red")]).unwrap();
    assert_eq!(cast[0].as_index(), Some(0));
}

#[test]
fn rename_keys_renames_columns() {
    let dictionary = sample_dictionary();
    let mapping = BTreeMap::from([("host_age".to_string(), "age".to_string())]);
    let renamed = dictionary.rename_keys(&mapping).unwrap();
    assert_eq!(renamed.get("age").map(|c| c.name.as_str()), Some("age"));
    assert!(!renamed.contains("host_age"));
    assert!(dictionary.contains("host_age"));
}
