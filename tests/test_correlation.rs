//! Integration tests for correlation analysis and reduction

use benford::pipeline::{
    correlation_matrix, CorrelatedFeatureSelector, CorrelationAnalyzer, CorrelationMethod,
    SelectionMethod, SmartCorrelatedSelection,
};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_perfectly_correlated_pair_drops_exactly_one() {
    let df = df! {
        "x" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
        "y" => [2.0f64, 4.0, 6.0, 8.0, 10.0],
    }
    .unwrap();

    let to_drop = CorrelationAnalyzer::new()
        .columns_to_remove(&df, 0.9, CorrelationMethod::Pearson, SelectionMethod::Variance)
        .unwrap();

    assert_eq!(to_drop, vec!["x"], "Higher-variance y should be kept");
}

#[test]
fn test_threshold_one_catches_perfect_correlation() {
    let df = df! {
        "x" => [0.1f64, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7],
        "y" => [0.3f64, 0.6, 0.9, 1.2, 1.5, 1.8, 2.1],
    }
    .unwrap();

    let to_drop = CorrelationAnalyzer::new()
        .columns_to_remove(&df, 1.0, CorrelationMethod::Pearson, SelectionMethod::Variance)
        .unwrap();
    assert_eq!(to_drop.len(), 1);
}

#[test]
fn test_variance_keeps_widest_member_of_group() {
    let df = common::create_correlation_test_dataframe();

    let mut selector =
        SmartCorrelatedSelection::new(0.9, CorrelationMethod::Pearson, SelectionMethod::Variance);
    let to_drop = selector.fit(&df).unwrap();

    assert_eq!(selector.correlated_groups(), &[vec!["b", "a", "c"]]);
    assert_eq!(to_drop, vec!["a", "c"]);
    assert_eq!(selector.features_to_drop(), to_drop.as_slice());
}

#[test]
fn test_analyzer_select_exposes_groups_and_drops() {
    let df = common::create_correlation_test_dataframe();
    let analyzer = CorrelationAnalyzer::new();

    let selector = analyzer
        .select(&df, 0.9, CorrelationMethod::Pearson, SelectionMethod::Variance)
        .unwrap();
    assert_eq!(selector.correlated_groups(), &[vec!["b", "a", "c"]]);

    let to_drop = analyzer
        .columns_to_remove(&df, 0.9, CorrelationMethod::Pearson, SelectionMethod::Variance)
        .unwrap();
    assert_eq!(selector.features_to_drop(), to_drop.as_slice());
    assert_eq!(to_drop, vec!["a", "c"]);
}

#[test]
fn test_cardinality_ties_keep_dataset_order() {
    let df = common::create_correlation_test_dataframe();

    let to_drop = CorrelationAnalyzer::new()
        .columns_to_remove(
            &df,
            0.9,
            CorrelationMethod::Pearson,
            SelectionMethod::Cardinality,
        )
        .unwrap();

    assert_eq!(to_drop, vec!["b", "c"]);
}

#[test]
fn test_missing_values_prefers_complete_column() {
    let df = df! {
        "sparse" => [Some(1.0f64), None, Some(3.0), Some(4.0), Some(5.0), Some(6.0)],
        "full" => [Some(2.0f64), Some(4.0), Some(6.0), Some(8.0), Some(10.0), Some(12.0)],
    }
    .unwrap();

    let to_drop = CorrelationAnalyzer::new()
        .columns_to_remove(
            &df,
            0.95,
            CorrelationMethod::Pearson,
            SelectionMethod::MissingValues,
        )
        .unwrap();

    assert_eq!(to_drop, vec!["sparse"]);
}

#[test]
fn test_spearman_sees_monotonic_relationship() {
    let x: Vec<f64> = (1..=12).map(|v| v as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| v.powi(5)).collect();
    let df = df! { "x" => x, "y" => y }.unwrap();
    let analyzer = CorrelationAnalyzer::new();

    let pearson = analyzer
        .columns_to_remove(&df, 0.99, CorrelationMethod::Pearson, SelectionMethod::Variance)
        .unwrap();
    let spearman = analyzer
        .columns_to_remove(&df, 0.99, CorrelationMethod::Spearman, SelectionMethod::Variance)
        .unwrap();
    let kendall = analyzer
        .columns_to_remove(&df, 0.99, CorrelationMethod::Kendall, SelectionMethod::Variance)
        .unwrap();

    assert!(pearson.is_empty());
    assert_eq!(spearman, vec!["x"]);
    assert_eq!(kendall, vec!["x"]);
}

#[test]
fn test_uncorrelated_columns_kept() {
    let df = df! {
        "a" => [1.0f64, 5.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0, 9.0, 0.0],
        "b" => [9.0f64, 2.0, 7.0, 1.0, 6.0, 3.0, 8.0, 4.0, 0.0, 5.0],
    }
    .unwrap();

    let to_drop = CorrelationAnalyzer::new()
        .columns_to_remove(&df, 0.95, CorrelationMethod::Pearson, SelectionMethod::Variance)
        .unwrap();
    assert!(to_drop.is_empty());
}

#[test]
fn test_process_keeps_non_numeric_columns() {
    let mut df = common::create_correlation_test_dataframe();
    df.with_column(Column::new(
        "label".into(),
        ["p", "q", "r", "s", "t", "u", "v", "w", "x", "y"],
    ))
    .unwrap();

    let reduced = CorrelationAnalyzer::new()
        .process(&df, 0.9, CorrelationMethod::Pearson, SelectionMethod::Variance)
        .unwrap();

    common::assert_shape(&reduced, 10, 3);
    common::assert_has_columns(&reduced, &["b", "d", "label"]);
    common::assert_missing_columns(&reduced, &["a", "c"]);
    // Input untouched
    assert_eq!(df.width(), 5);
}

#[test]
fn test_validate_truth_table() {
    let analyzer = CorrelationAnalyzer::new();

    assert!(analyzer.validate("pearson", 0.8, "variance"));
    assert!(analyzer.validate("spearman", 0.0, "missing_values"));
    assert!(analyzer.validate("kendall", 1.0, "cardinality"));

    assert!(!analyzer.validate("cosine", 0.8, "variance"));
    assert!(!analyzer.validate("pearson", 0.8, "model_performance"));
    assert!(!analyzer.validate("pearson", 1.5, "variance"));
    assert!(!analyzer.validate("pearson", -0.1, "variance"));
    assert!(!analyzer.validate("pearson", f64::NAN, "variance"));
}

#[test]
fn test_matrix_is_symmetric_with_unit_diagonal() {
    let df = common::create_correlation_test_dataframe();
    let matrix = correlation_matrix(&df, CorrelationMethod::Pearson).unwrap();

    assert_eq!(matrix.names(), &["a", "b", "c", "d"]);
    for i in 0..matrix.len() {
        assert!((matrix.get(i, i) - 1.0).abs() < 1e-12);
        for j in 0..matrix.len() {
            assert!((matrix.get(i, j) - matrix.get(j, i)).abs() < 1e-12);
        }
    }
    assert!((matrix.between("a", "c").unwrap() + 1.0).abs() < 1e-12);
}

#[test]
fn test_correlated_pairs_sorted_by_strength() {
    let df = common::create_correlation_test_dataframe();
    let matrix = correlation_matrix(&df, CorrelationMethod::Pearson).unwrap();

    let pairs = matrix.correlated_pairs(0.9);
    assert_eq!(pairs.len(), 3);
    assert!(pairs.iter().all(|p| p.correlation.abs() > 0.999));
    assert!(pairs.iter().all(|p| p.feature1 != "d" && p.feature2 != "d"));
}

#[test]
fn test_large_matrix_path_finds_planted_pair() {
    let mut df = common::create_random_dataframe(200, 20, 3);
    let base: Vec<f64> = df
        .column("feature_0")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .map(|v| v * 3.0 + 1.0)
        .collect();
    df.with_column(Column::new("planted".into(), base)).unwrap();

    let to_drop = CorrelationAnalyzer::new()
        .columns_to_remove(&df, 0.95, CorrelationMethod::Pearson, SelectionMethod::Variance)
        .unwrap();

    assert_eq!(to_drop, vec!["feature_0"]);
}

#[test]
fn test_correlation_statistics_signed_means() {
    let df = df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0],
        "c" => [4.0f64, 3.0, 2.0, 1.0],
    }
    .unwrap();

    let stats = CorrelationAnalyzer::new()
        .correlation_statistics(&df, CorrelationMethod::Pearson)
        .unwrap();

    assert_eq!(stats.average_correlation.len(), 3);
    // a: mean(r_ab = 1, r_ac = -1) = 0
    assert!(stats.average_correlation[0].1.abs() < 1e-12);
    // c: mean(-1, -1) = -1
    assert!((stats.average_correlation[2].1 + 1.0).abs() < 1e-12);
    assert!((stats.max_correlation.unwrap() - 1.0).abs() < 1e-12);
}
