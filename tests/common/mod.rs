//! Shared test utilities and fixture generators
#![allow(dead_code)]

use benford::config::ServiceConfig;
use benford::service::AnalysisService;
use benford::store::DatasetStore;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// Benford proportion of leading digit `d`
pub fn benford_probability(d: u32) -> f64 {
    (1.0 + 1.0 / d as f64).log10()
}

/// Transaction-like CSV: `TransactionID`, `Amount`, `CustomerID`.
///
/// Amounts are log-uniform over several decades, so their leading digits
/// roughly follow Benford's law, and every amount is distinct.
pub fn transactions_csv(rows: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut csv = String::from("TransactionID,Amount,CustomerID\n");
    for i in 0..rows {
        let exponent: f64 = rng.gen_range(0.0..4.0);
        let amount = 10f64.powf(exponent) + i as f64 * 1e-4;
        let customer: u32 = rng.gen_range(1000..2000);
        csv.push_str(&format!("{},{:.4},{}\n", i + 1, amount, customer));
    }
    csv.into_bytes()
}

/// Integers whose leading digits match Benford's law as closely as rounding allows.
pub fn benford_values(n: usize) -> Vec<i64> {
    let mut values = Vec::with_capacity(n);
    for d in 1..=9u32 {
        let count = (benford_probability(d) * n as f64).round() as usize;
        for k in 0..count {
            // Vary magnitude and trailing digits, keeping the leading digit
            let magnitude = 10i64.pow((k % 4) as u32);
            values.push(d as i64 * magnitude * 10 + (k % 10) as i64);
        }
    }
    values
}

/// Integers whose leading digits are uniformly distributed over 1..=9.
pub fn uniform_digit_values(per_digit: usize) -> Vec<i64> {
    (1..=9i64)
        .flat_map(|d| (0..per_digit).map(move |k| d * 100 + (k % 100) as i64))
        .collect()
}

/// Create a DataFrame with known correlation patterns
pub fn create_correlation_test_dataframe() -> DataFrame {
    df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0], // b = 2a
        "c" => [10.0f64, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0], // c = 11 - a
        "d" => [5.0f64, 1.0, 8.0, 2.0, 9.0, 3.0, 7.0, 4.0, 6.0, 0.0], // Unrelated
    }
    .unwrap()
}

/// Random uncorrelated columns, for larger correlation matrices
pub fn create_random_dataframe(rows: usize, cols: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let columns: Vec<Column> = (0..cols)
        .map(|i| {
            let values: Vec<f64> = (0..rows).map(|_| rng.gen::<f64>()).collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();
    DataFrame::new(columns).unwrap()
}

/// Serialize a DataFrame to CSV bytes
pub fn csv_bytes(df: &mut DataFrame) -> Vec<u8> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).finish(df).unwrap();
    buf
}

/// Store in a fresh temporary directory
pub fn temp_store() -> (TempDir, DatasetStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = DatasetStore::open(temp_dir.path()).unwrap();
    (temp_dir, store)
}

/// Service over a fresh temporary store, default settings otherwise
pub fn temp_service() -> (TempDir, AnalysisService) {
    let temp_dir = TempDir::new().unwrap();
    let service = AnalysisService::new(ServiceConfig::with_store_dir(temp_dir.path())).unwrap();
    (temp_dir, service)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}
