//! Benchmark correlation matrices and correlated feature selection
//!
//! Run with: cargo bench --bench correlation_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;

use benford::pipeline::{
    correlation_matrix, CorrelatedFeatureSelector, CorrelationMethod, SelectionMethod,
    SmartCorrelatedSelection,
};

/// Generate synthetic transaction features with some correlated columns
fn generate_test_dataframe(n_rows: usize, n_features: usize, seed: u64) -> DataFrame {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(n_features);

    for i in 0..n_features {
        let values: Vec<f64> = match i % 3 {
            // Log-uniform amounts
            0 => (0..n_rows)
                .map(|_| 10f64.powf(rng.gen::<f64>() * 4.0))
                .collect(),
            1 => (0..n_rows).map(|_| rng.gen::<f64>() * 100.0).collect(),
            // Noisy copy of the previous column
            _ => columns[i - 1]
                .iter()
                .map(|v| v * 1.5 + rng.gen::<f64>() * 5.0)
                .collect(),
        };
        columns.push(values);
    }

    let columns: Vec<Column> = columns
        .into_iter()
        .enumerate()
        .map(|(i, values)| Column::new(format!("feature_{}", i).into(), values))
        .collect();
    DataFrame::new(columns).expect("Failed to create DataFrame")
}

/// Correlation matrix cost per method as the column count grows
fn benchmark_matrix_by_columns(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_matrix_by_columns");
    group.sample_size(20);

    let n_rows = 5_000;
    for n_cols in [5, 10, 25, 50] {
        let df = generate_test_dataframe(n_rows, n_cols, 42);
        group.throughput(Throughput::Elements(((n_cols * (n_cols - 1)) / 2) as u64));

        for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman] {
            group.bench_with_input(BenchmarkId::new(method.as_str(), n_cols), &df, |b, df| {
                b.iter(|| correlation_matrix(black_box(df), black_box(method)));
            });
        }
    }

    group.finish();
}

/// Kendall cost as the row count grows
fn benchmark_kendall_by_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("kendall_by_rows");
    group.sample_size(10);

    for n_rows in [1_000, 10_000, 50_000, 100_000] {
        let df = generate_test_dataframe(n_rows, 6, 42);
        group.throughput(Throughput::Elements(n_rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &df, |b, df| {
            b.iter(|| correlation_matrix(black_box(df), black_box(CorrelationMethod::Kendall)));
        });
    }

    group.finish();
}

/// Full fit: matrix, ranking and greedy grouping
fn benchmark_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("smart_correlated_selection");
    group.sample_size(20);

    let df = generate_test_dataframe(10_000, 30, 7);
    for selection in [
        SelectionMethod::Variance,
        SelectionMethod::MissingValues,
        SelectionMethod::Cardinality,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(selection.as_str()),
            &df,
            |b, df| {
                b.iter(|| {
                    let mut selector =
                        SmartCorrelatedSelection::new(0.8, CorrelationMethod::Pearson, selection);
                    selector.fit(black_box(df))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_matrix_by_columns,
    benchmark_kendall_by_rows,
    benchmark_selection
);
criterion_main!(benches);
