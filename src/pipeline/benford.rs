//! Benford's-law first-digit analysis
//!
//! Compares the empirical distribution of leading digits in a column against
//! the theoretical `P(d) = log10(1 + 1/d)` and runs a chi-square
//! goodness-of-fit test over the nine digit classes (8 degrees of freedom).

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

use crate::error::{AnalyzerError, Result};
use crate::pipeline::loader::render_value;

/// Digits considered by the test
pub const DIGITS: std::ops::RangeInclusive<u8> = 1..=9;

/// Degrees of freedom of the goodness-of-fit test (nine classes minus one)
pub const DEGREES_OF_FREEDOM: f64 = 8.0;

/// Outcome of a Benford analysis on one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenfordAnalysis {
    /// Observed share of each leading digit (every digit 1-9 present)
    pub empirical_probs: BTreeMap<u8, f64>,
    /// Theoretical Benford share of each leading digit
    pub benford_probs: BTreeMap<u8, f64>,
    pub chi_stat: f64,
    pub p_value: f64,
    /// Number of values that yielded a leading digit
    pub total_count: usize,
}

/// Leading nonzero digit of a value's decimal representation.
///
/// Leading `-`, `0` and `.` characters are stripped; `None` when the first
/// remaining character is not a digit 1-9 (zero values, text, infinities).
pub fn first_digit(repr: &str) -> Option<u8> {
    let stripped = repr.trim_start_matches(['-', '0', '.']);
    match stripped.chars().next() {
        Some(c @ '1'..='9') => Some(c as u8 - b'0'),
        _ => None,
    }
}

/// Leading digits of every non-missing value in a column.
pub fn extract_first_digits(column: &Column) -> Result<Vec<u8>> {
    let mut digits = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        if let Some(digit) = render_value(&column.get(idx)?)
            .as_deref()
            .and_then(first_digit)
        {
            digits.push(digit);
        }
    }
    Ok(digits)
}

/// Theoretical Benford probability for each digit 1-9
pub fn benford_distribution() -> BTreeMap<u8, f64> {
    DIGITS
        .map(|d| (d, (1.0 + 1.0 / d as f64).log10()))
        .collect()
}

/// Observed probability of each digit 1-9; digits never seen get 0.
pub fn empirical_distribution(first_digits: &[u8]) -> BTreeMap<u8, f64> {
    let mut counts: BTreeMap<u8, usize> = DIGITS.map(|d| (d, 0)).collect();
    for d in first_digits {
        if let Some(count) = counts.get_mut(d) {
            *count += 1;
        }
    }

    let total = first_digits.len() as f64;
    counts
        .into_iter()
        .map(|(d, count)| {
            let prob = if total > 0.0 { count as f64 / total } else { 0.0 };
            (d, prob)
        })
        .collect()
}

/// Chi-square goodness-of-fit statistic and p-value.
///
/// Observed and expected counts are the probabilities scaled by `total_count`.
pub fn chi_square_test(
    empirical: &BTreeMap<u8, f64>,
    benford: &BTreeMap<u8, f64>,
    total_count: usize,
) -> Result<(f64, f64)> {
    let n = total_count as f64;
    let chi_stat: f64 = DIGITS
        .map(|d| {
            let observed = empirical.get(&d).copied().unwrap_or(0.0) * n;
            let expected = benford.get(&d).copied().unwrap_or(0.0) * n;
            (observed - expected).powi(2) / expected
        })
        .sum();

    let dist =
        ChiSquared::new(DEGREES_OF_FREEDOM).map_err(|e| AnalyzerError::Stats(e.to_string()))?;
    Ok((chi_stat, dist.sf(chi_stat)))
}

/// Stateless Benford analyzer
#[derive(Debug, Default, Clone, Copy)]
pub struct BenfordAnalyzer;

impl BenfordAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Run the first-digit analysis on `column` of `df`.
    pub fn analyze(&self, df: &DataFrame, column: &str) -> Result<BenfordAnalysis> {
        let col = df
            .column(column)
            .map_err(|_| AnalyzerError::ColumnNotFound(column.to_string()))?;

        let first_digits = extract_first_digits(col)?;
        if first_digits.is_empty() {
            return Err(AnalyzerError::Computation(format!(
                "Column '{}' has no values with a leading digit 1-9",
                column
            )));
        }

        let benford_probs = benford_distribution();
        let empirical_probs = empirical_distribution(&first_digits);
        let (chi_stat, p_value) =
            chi_square_test(&empirical_probs, &benford_probs, first_digits.len())?;

        debug!(
            column,
            observations = first_digits.len(),
            chi_stat,
            p_value,
            "benford analysis complete"
        );

        Ok(BenfordAnalysis {
            empirical_probs,
            benford_probs,
            chi_stat,
            p_value,
            total_count: first_digits.len(),
        })
    }
}
