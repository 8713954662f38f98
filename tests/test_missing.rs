//! Tests for missing value counting and its use in correlated column selection

use benford::pipeline::{
    missing_counts, parse_csv_bytes, row_to_json, CorrelatedFeatureSelector, CorrelationMethod,
    SelectionMethod, SmartCorrelatedSelection,
};
use polars::prelude::*;
use serde_json::Value;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_missing_counts_from_csv() {
    let csv = b"Amount,Fee,Note\n10.5,,x\n,1.0,\n7.25,2.0,z\n,,\n";
    let df = parse_csv_bytes(csv, 100).unwrap();

    let counts: std::collections::HashMap<_, _> = missing_counts(&df).unwrap().into_iter().collect();
    assert_eq!(counts["Amount"], 2);
    assert_eq!(counts["Fee"], 2);
    assert_eq!(counts["Note"], 2);
}

#[test]
fn test_missing_counts_keeps_column_order() {
    let df = common::create_correlation_test_dataframe();
    let names: Vec<String> = missing_counts(&df)
        .unwrap()
        .into_iter()
        .map(|(name, count)| {
            assert_eq!(count, 0, "column {} should be complete", name);
            name
        })
        .collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
}

#[test]
fn test_missing_values_selection_keeps_most_complete_column() {
    // Same values, different holes: the column with fewest NaN survives
    let df = df! {
        "holey" => [Some(1.0f64), None, Some(3.0), None, Some(5.0), Some(6.0)],
        "full" => [Some(1.0f64), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)],
        "nan" => [Some(1.0f64), Some(f64::NAN), Some(3.0), Some(4.0), Some(5.0), Some(6.0)],
    }
    .unwrap();

    let mut selector = SmartCorrelatedSelection::new(
        0.9,
        CorrelationMethod::Pearson,
        SelectionMethod::MissingValues,
    );
    let dropped = selector.fit(&df).unwrap();

    assert_eq!(dropped, vec!["nan", "holey"]);
    assert_eq!(
        selector.correlated_groups().to_vec(),
        vec![vec!["full".to_string(), "nan".to_string(), "holey".to_string()]]
    );
    common::assert_has_columns(&selector.transform(&df), &["full"]);
}

#[test]
fn test_missing_cells_become_json_null() {
    let df = df! {
        "Amount" => [Some(1.5f64), Some(f64::NAN), None],
        "Name" => [Some("a"), None, Some("c")],
    }
    .unwrap();

    let second = row_to_json(&df, 1).unwrap();
    assert_eq!(second["Amount"], Value::Null);
    assert_eq!(second["Name"], Value::Null);

    let third = row_to_json(&df, 2).unwrap();
    assert_eq!(third["Amount"], Value::Null);
    assert_eq!(third["Name"], Value::from("c"));
}
