//! Correlation-based feature reduction
//!
//! Computes pairwise correlations (Pearson, Spearman or Kendall) between the
//! numeric columns of a dataset, groups columns that are correlated above a
//! threshold and keeps one representative per group according to a
//! tie-break rule.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyzerError, Result};
use crate::pipeline::loader::{column_as_f64, numeric_column_names};
use crate::pipeline::missing::missing_counts;

/// Tolerance applied to the threshold comparison so that rounding error cannot
/// hide a perfect correlation
pub const CORRELATION_EPSILON: f64 = 1e-9;

/// Threshold for auto-selecting matrix vs pairwise Pearson computation.
/// Matrix multiplication is more efficient when there are many columns.
const MATRIX_METHOD_COLUMN_THRESHOLD: usize = 15;

/// Correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
    Kendall,
}

impl CorrelationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Kendall => "kendall",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            "kendall" => Ok(CorrelationMethod::Kendall),
            other => Err(AnalyzerError::Validation(format!(
                "unknown correlation method '{}', expected pearson, spearman or kendall",
                other
            ))),
        }
    }
}

/// Rule deciding which member of a correlated group survives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Keep the column with the highest standard deviation
    Variance,
    /// Keep the column with the fewest missing values
    MissingValues,
    /// Keep the column with the most distinct values
    Cardinality,
}

impl SelectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMethod::Variance => "variance",
            SelectionMethod::MissingValues => "missing_values",
            SelectionMethod::Cardinality => "cardinality",
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMethod {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "variance" => Ok(SelectionMethod::Variance),
            "missing_values" => Ok(SelectionMethod::MissingValues),
            "cardinality" => Ok(SelectionMethod::Cardinality),
            other => Err(AnalyzerError::Validation(format!(
                "unknown selection method '{}', expected variance, missing_values or cardinality",
                other
            ))),
        }
    }
}

/// Represents a correlated pair of features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Square correlation matrix over the numeric columns of a dataset.
///
/// Undefined entries (constant columns, fewer than two complete pairs) are NaN.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.names.len() + j]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Correlation between two columns by name, `None` if undefined or unknown.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let value = self.get(self.index_of(a)?, self.index_of(b)?);
        (!value.is_nan()).then_some(value)
    }

    /// Pairs with `|r| >= threshold`, sorted by absolute correlation descending.
    pub fn correlated_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.len();
        let mut pairs = Vec::new();

        for i in 0..n {
            for j in (i + 1)..n {
                let corr = self.get(i, j);
                if exceeds_threshold(corr, threshold) {
                    pairs.push(CorrelatedPair {
                        feature1: self.names[i].clone(),
                        feature2: self.names[j].clone(),
                        correlation: corr,
                    });
                }
            }
        }

        pairs.sort_by(|a, b| {
            b.correlation
                .abs()
                .partial_cmp(&a.correlation.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs
    }
}

/// `|r| >= threshold`, with [`CORRELATION_EPSILON`] slack; NaN never qualifies
pub fn exceeds_threshold(corr: f64, threshold: f64) -> bool {
    !corr.is_nan() && corr.abs() >= threshold - CORRELATION_EPSILON
}

/// Numeric columns as `f64` vectors, nulls and NaN as `None`
fn numeric_columns(df: &DataFrame) -> Result<Vec<(String, Vec<Option<f64>>)>> {
    numeric_column_names(df)
        .into_iter()
        .map(|name| {
            let values = column_as_f64(df, &name)?;
            Ok((name, values))
        })
        .collect()
}

/// Compute the correlation matrix of the numeric columns of `df`.
///
/// Pairs use pairwise-complete observations. Pearson on at least 15 columns
/// without missing values goes through a single matrix product instead.
pub fn correlation_matrix(df: &DataFrame, method: CorrelationMethod) -> Result<CorrelationMatrix> {
    let columns = numeric_columns(df)?;
    let has_missing = columns.iter().any(|(_, v)| v.iter().any(|x| x.is_none()));

    if method == CorrelationMethod::Pearson
        && !has_missing
        && columns.len() >= MATRIX_METHOD_COLUMN_THRESHOLD
    {
        Ok(correlation_matrix_fast(&columns))
    } else {
        Ok(correlation_matrix_pairwise(&columns, method))
    }
}

/// Pairwise computation over the upper triangle, in parallel via Rayon
fn correlation_matrix_pairwise(
    columns: &[(String, Vec<Option<f64>>)],
    method: CorrelationMethod,
) -> CorrelationMatrix {
    let n = columns.len();
    let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let correlations: Vec<(usize, usize, f64)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let corr = pairwise_correlation(&columns[i].1, &columns[j].1, method)
                .unwrap_or(f64::NAN);
            (i, j, corr)
        })
        .collect();

    let mut values = vec![f64::NAN; n * n];
    for (i, (_, column)) in columns.iter().enumerate() {
        if is_varying(column) {
            values[i * n + i] = 1.0;
        }
    }
    for (i, j, corr) in correlations {
        values[i * n + j] = corr;
        values[j * n + i] = corr;
    }

    CorrelationMatrix { names, values }
}

fn is_varying(values: &[Option<f64>]) -> bool {
    let mut present = values.iter().flatten();
    match present.next() {
        Some(first) => present.any(|v| v != first),
        None => false,
    }
}

/// Compute correlation matrix using matrix operations (much faster for many columns).
///
/// Algorithm:
/// 1. Standardize each column: Z = (X - mean) / (std * sqrt(n))
/// 2. Compute correlation matrix: R = Z^T * Z
///
/// Constant columns get NaN rows and columns.
fn correlation_matrix_fast(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let n_cols = columns.len();
    let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
    let n_rows = columns.first().map_or(0, |(_, v)| v.len());

    let standardized: Vec<Option<Vec<f64>>> = columns
        .par_iter()
        .map(|(_, values)| {
            let xs: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0)).collect();
            let n = xs.len() as f64;
            if n == 0.0 {
                return None;
            }
            let mean = xs.iter().sum::<f64>() / n;
            let std = (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
            if std == 0.0 {
                return None; // Constant column
            }
            let scale = std * n.sqrt();
            Some(xs.iter().map(|x| (x - mean) / scale).collect())
        })
        .collect();

    let mut z = Mat::<f64>::zeros(n_rows, n_cols);
    for (col_idx, col_data) in standardized.iter().enumerate() {
        if let Some(col_data) = col_data {
            for (row_idx, &val) in col_data.iter().enumerate() {
                z[(row_idx, col_idx)] = val;
            }
        }
    }

    let product = z.transpose() * &z;

    let mut values = vec![f64::NAN; n_cols * n_cols];
    for i in 0..n_cols {
        for j in 0..n_cols {
            if standardized[i].is_some() && standardized[j].is_some() {
                values[i * n_cols + j] = product[(i, j)].clamp(-1.0, 1.0);
            }
        }
    }

    CorrelationMatrix { names, values }
}

/// Correlation between two columns over the rows where both are present.
pub fn pairwise_correlation(
    x: &[Option<f64>],
    y: &[Option<f64>],
    method: CorrelationMethod,
) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();

    if xs.len() < 2 {
        return None;
    }

    let corr = match method {
        CorrelationMethod::Pearson => pearson(&xs, &ys),
        CorrelationMethod::Spearman => pearson(&average_ranks(&xs), &average_ranks(&ys)),
        CorrelationMethod::Kendall => kendall_tau_b(&xs, &ys),
    }?;

    Some(corr.clamp(-1.0, 1.0))
}

/// Pearson correlation using Welford's single-pass algorithm
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let mut n = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (&x, &y) in xs.iter().zip(ys.iter()) {
        n += 1.0;
        let dx = x - mean_x;
        let dy = y - mean_y;
        mean_x += dx / n;
        mean_y += dy / n;
        var_x += dx * (x - mean_x);
        var_y += dy * (y - mean_y);
        cov_xy += dx * (y - mean_y);
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    Some(cov_xy / (var_x.sqrt() * var_y.sqrt()))
}

/// 1-based ranks, ties share the average of their positions
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Kendall's tau-b, which corrects for ties in either variable.
///
/// Knight's O(n log n) algorithm: sort by (x, y), then count the discordant
/// pairs as the swaps a merge sort on y needs.
fn kendall_tau_b(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 {
        return None;
    }

    // Fold -0.0 into 0.0 so total_cmp ordering agrees with equality
    let mut pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| (x + 0.0, y + 0.0))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let total_pairs = tied_pairs(n as u64);
    let ties_x = run_ties(&pairs, |a, b| a.0 == b.0);
    let ties_xy = run_ties(&pairs, |a, b| a == b);

    let mut sorted_y: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let mut buffer = vec![0.0; n];
    let swaps = merge_count_swaps(&mut sorted_y, &mut buffer);
    let ties_y = run_ties(&sorted_y, |a, b| a == b);

    let denom = ((total_pairs - ties_x) as f64 * (total_pairs - ties_y) as f64).sqrt();
    if denom == 0.0 {
        return None;
    }
    let numerator =
        total_pairs as f64 - ties_x as f64 - ties_y as f64 + ties_xy as f64 - 2.0 * swaps as f64;
    Some((numerator / denom).clamp(-1.0, 1.0))
}

fn tied_pairs(run: u64) -> u64 {
    run * run.saturating_sub(1) / 2
}

/// Pairs tied within runs of consecutive equal elements of a sorted slice
fn run_ties<T>(sorted: &[T], equal: impl Fn(&T, &T) -> bool) -> u64 {
    let mut ties = 0;
    let mut run = 1u64;
    for i in 1..sorted.len() {
        if equal(&sorted[i - 1], &sorted[i]) {
            run += 1;
        } else {
            ties += tied_pairs(run);
            run = 1;
        }
    }
    ties + tied_pairs(run)
}

/// Stable merge sort of `values`, returning the number of strictly inverted pairs
fn merge_count_swaps(values: &mut [f64], buffer: &mut [f64]) -> u64 {
    let n = values.len();
    if n < 2 {
        return 0;
    }
    let mid = n / 2;
    let mut swaps = merge_count_swaps(&mut values[..mid], &mut buffer[..mid])
        + merge_count_swaps(&mut values[mid..], &mut buffer[mid..]);

    let (mut i, mut j, mut k) = (0, mid, 0);
    while i < mid && j < n {
        if values[i] <= values[j] {
            buffer[k] = values[i];
            i += 1;
        } else {
            buffer[k] = values[j];
            swaps += (mid - i) as u64;
            j += 1;
        }
        k += 1;
    }
    buffer[k..k + mid - i].copy_from_slice(&values[i..mid]);
    k += mid - i;
    buffer[k..n].copy_from_slice(&values[j..n]);
    values.copy_from_slice(&buffer[..n]);
    swaps
}

/// Capability interface for correlated-feature selection backends.
pub trait CorrelatedFeatureSelector {
    /// Learn the correlated groups of `df` and return the columns to drop.
    fn fit(&mut self, df: &DataFrame) -> Result<Vec<String>>;
}

/// Groups correlated numeric columns and keeps the best member of each group.
///
/// Columns are ranked by the selection method (stable, so ties keep dataset
/// order). Walking that ranking, every column not yet examined anchors a group
/// that absorbs all remaining columns correlated with it; the anchor survives.
#[derive(Debug, Clone)]
pub struct SmartCorrelatedSelection {
    pub threshold: f64,
    pub method: CorrelationMethod,
    pub selection_method: SelectionMethod,
    correlated_groups: Vec<Vec<String>>,
    features_to_drop: Vec<String>,
}

impl SmartCorrelatedSelection {
    pub fn new(threshold: f64, method: CorrelationMethod, selection_method: SelectionMethod) -> Self {
        Self {
            threshold,
            method,
            selection_method,
            correlated_groups: Vec::new(),
            features_to_drop: Vec::new(),
        }
    }

    /// Correlated groups from the last fit; the first member of each is kept
    pub fn correlated_groups(&self) -> &[Vec<String>] {
        &self.correlated_groups
    }

    /// Columns to drop from the last fit, in selection order
    pub fn features_to_drop(&self) -> &[String] {
        &self.features_to_drop
    }

    /// Drop the selected columns from `df`, returning a new frame.
    pub fn transform(&self, df: &DataFrame) -> DataFrame {
        df.drop_many(self.features_to_drop.iter().map(|s| s.as_str()))
    }

    /// Rank numeric columns by the selection method, best first.
    fn rank_columns(&self, df: &DataFrame) -> Result<Vec<String>> {
        let columns = numeric_columns(df)?;
        let missing: HashMap<String, usize> = missing_counts(df)?.into_iter().collect();

        let mut keyed: Vec<(String, f64)> = columns
            .into_iter()
            .map(|(name, values)| {
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                let key = match self.selection_method {
                    // Descending order expressed as ascending on the negated key
                    SelectionMethod::Variance => -sample_std(&present).unwrap_or(f64::NEG_INFINITY),
                    SelectionMethod::Cardinality => -(distinct_count(&present) as f64),
                    SelectionMethod::MissingValues => {
                        missing.get(&name).copied().unwrap_or(0) as f64
                    }
                };
                (name, key)
            })
            .collect();

        keyed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(keyed.into_iter().map(|(name, _)| name).collect())
    }
}

impl CorrelatedFeatureSelector for SmartCorrelatedSelection {
    fn fit(&mut self, df: &DataFrame) -> Result<Vec<String>> {
        let matrix = correlation_matrix(df, self.method)?;
        let ranked = self.rank_columns(df)?;

        let mut examined: HashSet<&str> = HashSet::new();
        let mut groups = Vec::new();
        let mut to_drop = Vec::new();

        for (pos, anchor) in ranked.iter().enumerate() {
            if !examined.insert(anchor.as_str()) {
                continue;
            }

            let members: Vec<&String> = ranked[pos + 1..]
                .iter()
                .filter(|candidate| !examined.contains(candidate.as_str()))
                .filter(|candidate| {
                    matrix
                        .between(anchor, candidate)
                        .is_some_and(|r| exceeds_threshold(r, self.threshold))
                })
                .collect();

            if members.is_empty() {
                continue;
            }

            let mut group = vec![anchor.clone()];
            for member in members {
                examined.insert(member.as_str());
                group.push(member.clone());
                to_drop.push(member.clone());
            }
            groups.push(group);
        }

        debug!(
            method = %self.method,
            selection = %self.selection_method,
            threshold = self.threshold,
            groups = groups.len(),
            dropped = to_drop.len(),
            "correlated feature selection complete"
        );

        self.correlated_groups = groups;
        self.features_to_drop = to_drop.clone();
        Ok(to_drop)
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

fn distinct_count(values: &[f64]) -> usize {
    values
        .iter()
        .map(|v| if *v == 0.0 { 0u64 } else { v.to_bits() })
        .collect::<HashSet<u64>>()
        .len()
}

/// Average and maximum off-diagonal correlation of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationStatistics {
    /// Mean correlation of each column with every other column
    pub average_correlation: Vec<(String, f64)>,
    /// Largest off-diagonal correlation, if any is defined
    pub max_correlation: Option<f64>,
}

/// Settings validation and correlation-based reduction.
#[derive(Debug, Clone)]
pub struct CorrelationAnalyzer {
    pub default_method: CorrelationMethod,
    pub default_threshold: f64,
    pub default_selection_method: SelectionMethod,
}

impl Default for CorrelationAnalyzer {
    fn default() -> Self {
        Self {
            default_method: CorrelationMethod::Pearson,
            default_threshold: 0.8,
            default_selection_method: SelectionMethod::Variance,
        }
    }
}

impl CorrelationAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff both names are known and `0 <= threshold <= 1`.
    pub fn validate(&self, method: &str, threshold: f64, selection_method: &str) -> bool {
        method.parse::<CorrelationMethod>().is_ok()
            && selection_method.parse::<SelectionMethod>().is_ok()
            && (0.0..=1.0).contains(&threshold)
    }

    /// Fitted selector exposing both the drop list and the correlated groups.
    pub fn select(
        &self,
        df: &DataFrame,
        threshold: f64,
        method: CorrelationMethod,
        selection_method: SelectionMethod,
    ) -> Result<SmartCorrelatedSelection> {
        let mut selector = SmartCorrelatedSelection::new(threshold, method, selection_method);
        selector.fit(df)?;
        Ok(selector)
    }

    /// Columns that reduction would remove. The dataset is not modified.
    pub fn columns_to_remove(
        &self,
        df: &DataFrame,
        threshold: f64,
        method: CorrelationMethod,
        selection_method: SelectionMethod,
    ) -> Result<Vec<String>> {
        Ok(self
            .select(df, threshold, method, selection_method)?
            .features_to_drop()
            .to_vec())
    }

    /// New dataset with the redundant columns removed.
    ///
    /// Settings are not re-validated here; callers check them with [`Self::validate`].
    pub fn process(
        &self,
        df: &DataFrame,
        threshold: f64,
        method: CorrelationMethod,
        selection_method: SelectionMethod,
    ) -> Result<DataFrame> {
        Ok(self
            .select(df, threshold, method, selection_method)?
            .transform(df))
    }

    /// Per-column average correlation and the overall maximum, diagonal excluded.
    pub fn correlation_statistics(
        &self,
        df: &DataFrame,
        method: CorrelationMethod,
    ) -> Result<CorrelationStatistics> {
        let matrix = correlation_matrix(df, method)?;
        let n = matrix.len();

        let mut average_correlation = Vec::with_capacity(n);
        let mut max_correlation: Option<f64> = None;

        for i in 0..n {
            let off_diagonal: Vec<f64> = (0..n)
                .filter(|&j| j != i)
                .map(|j| matrix.get(i, j))
                .filter(|r| !r.is_nan())
                .collect();

            if off_diagonal.is_empty() {
                continue;
            }

            let mean = off_diagonal.iter().sum::<f64>() / off_diagonal.len() as f64;
            average_correlation.push((matrix.names()[i].clone(), mean));

            let col_max = off_diagonal.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            max_correlation = Some(max_correlation.map_or(col_max, |m| m.max(col_max)));
        }

        Ok(CorrelationStatistics {
            average_correlation,
            max_correlation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            "spearman".parse::<CorrelationMethod>().unwrap(),
            CorrelationMethod::Spearman
        );
        assert!("Pearson".parse::<CorrelationMethod>().is_err());
        assert_eq!(
            "missing_values".parse::<SelectionMethod>().unwrap(),
            SelectionMethod::MissingValues
        );
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_kendall_perfect_orders() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(kendall_tau_b(&x, &[2.0, 4.0, 6.0, 8.0]), Some(1.0));
        assert_eq!(kendall_tau_b(&x, &[8.0, 6.0, 4.0, 2.0]), Some(-1.0));
    }

    /// Direct pair-by-pair tau-b, for checking the merge-sort version
    fn kendall_by_pairs(xs: &[f64], ys: &[f64]) -> f64 {
        let (mut concordant, mut discordant, mut only_x, mut only_y) = (0i64, 0i64, 0i64, 0i64);
        for i in 0..xs.len() {
            for j in (i + 1)..xs.len() {
                let dx = xs[i] - xs[j];
                let dy = ys[i] - ys[j];
                if dx == 0.0 && dy == 0.0 {
                    continue;
                } else if dx == 0.0 {
                    only_x += 1;
                } else if dy == 0.0 {
                    only_y += 1;
                } else if (dx > 0.0) == (dy > 0.0) {
                    concordant += 1;
                } else {
                    discordant += 1;
                }
            }
        }
        let denom = (((concordant + discordant + only_x) * (concordant + discordant + only_y))
            as f64)
            .sqrt();
        (concordant - discordant) as f64 / denom
    }

    #[test]
    fn test_kendall_matches_pairwise_count_with_ties() {
        let xs: Vec<f64> = (0..200).map(|i| ((i * 37) % 11) as f64).collect();
        let ys: Vec<f64> = (0..200)
            .map(|i| ((i * 53) % 7) as f64 + if i % 5 == 0 { -0.0 } else { 0.0 })
            .collect();

        let fast = kendall_tau_b(&xs, &ys).unwrap();
        let slow = kendall_by_pairs(&xs, &ys);
        assert!((fast - slow).abs() < 1e-12, "fast {} vs pairwise {}", fast, slow);
    }

    #[test]
    fn test_kendall_constant_is_undefined() {
        assert_eq!(kendall_tau_b(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]), None);
        assert_eq!(kendall_tau_b(&[1.0], &[2.0]), None);
    }

    #[test]
    fn test_spearman_monotonic_nonlinear() {
        let x: Vec<Option<f64>> = (1..=10).map(|v| Some(v as f64)).collect();
        let y: Vec<Option<f64>> = (1..=10).map(|v| Some((v as f64).powi(3))).collect();

        let spearman = pairwise_correlation(&x, &y, CorrelationMethod::Spearman).unwrap();
        let pearson = pairwise_correlation(&x, &y, CorrelationMethod::Pearson).unwrap();

        assert!((spearman - 1.0).abs() < 1e-12);
        assert!(pearson < 0.99);
    }

    #[test]
    fn test_pairwise_complete_observations() {
        let x = vec![Some(1.0), Some(2.0), None, Some(4.0)];
        let y = vec![Some(2.0), Some(4.0), Some(100.0), Some(8.0)];
        let corr = pairwise_correlation(&x, &y, CorrelationMethod::Pearson).unwrap();
        assert!((corr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_uncorrelated() {
        let x = vec![Some(1.0), Some(2.0), Some(3.0)];
        let y = vec![Some(5.0), Some(5.0), Some(5.0)];
        assert_eq!(pairwise_correlation(&x, &y, CorrelationMethod::Pearson), None);
    }

    #[test]
    fn test_fast_matrix_matches_pairwise() {
        let columns: Vec<(String, Vec<Option<f64>>)> = (0..4)
            .map(|c| {
                let values = (0..20)
                    .map(|r| Some(((r * (c + 3)) % 7) as f64 + r as f64 * 0.1 * c as f64))
                    .collect();
                (format!("f{}", c), values)
            })
            .collect();

        let fast = correlation_matrix_fast(&columns);
        let slow = correlation_matrix_pairwise(&columns, CorrelationMethod::Pearson);

        for i in 0..4 {
            for j in 0..4 {
                let (a, b) = (fast.get(i, j), slow.get(i, j));
                assert!((a - b).abs() < 1e-9, "({i},{j}): {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_exceeds_threshold_tolerance() {
        assert!(exceeds_threshold(0.999_999_999_9, 1.0));
        assert!(exceeds_threshold(-0.85, 0.8));
        assert!(!exceeds_threshold(0.79, 0.8));
        assert!(!exceeds_threshold(f64::NAN, 0.0));
    }
}
