//! Multivariate anomaly detection
//!
//! Pipeline: per-column mean imputation, standard scaling, then an
//! [`OutlierModel`] (an [`IsolationForest`] by default). Every stage is
//! learned in [`AnomalyDetector::fit`] and reused unchanged by `predict` and
//! `score`.

use polars::prelude::*;
use tracing::debug;

use crate::config::{DEFAULT_CONTAMINATION, DEFAULT_N_ESTIMATORS, DEFAULT_RANDOM_SEED};
use crate::error::{AnalyzerError, Result};
use crate::pipeline::isolation_forest::{IsolationForest, IsolationForestConfig};
use crate::pipeline::loader::{column_as_f64, column_names};

/// Label for an anomalous row
pub const ANOMALY: i8 = -1;

/// Label for a normal row
pub const NORMAL: i8 = 1;

/// Capability interface for outlier-scoring backends.
///
/// Rows are dense, fully imputed feature vectors of equal width.
pub trait OutlierModel: Send + Sync {
    /// Learn the model from training rows.
    fn fit(&mut self, features: &[Vec<f64>]) -> Result<()>;

    /// Decision function per row: lower is more anomalous, negative is an anomaly.
    fn score(&self, features: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// [`ANOMALY`] or [`NORMAL`] per row.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<i8>> {
        Ok(self
            .score(features)?
            .into_iter()
            .map(|s| if s < 0.0 { ANOMALY } else { NORMAL })
            .collect())
    }
}

/// Replaces missing values with the per-column mean seen at fit time.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanImputer {
    means: Vec<f64>,
}

impl MeanImputer {
    /// Learn column means from non-missing values. All-missing columns impute 0.0.
    pub fn fit(columns: &[Vec<Option<f64>>]) -> Self {
        let means = columns
            .iter()
            .map(|values| {
                let (sum, count) = values
                    .iter()
                    .flatten()
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64
                }
            })
            .collect();
        Self { means }
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Fill missing values column by column.
    pub fn transform(&self, columns: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
        columns
            .iter()
            .zip(&self.means)
            .map(|(values, mean)| values.iter().map(|v| v.unwrap_or(*mean)).collect())
            .collect()
    }
}

/// Centers each column on its fit-time mean and divides by its population
/// standard deviation (1.0 when the column is constant).
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(columns: &[Vec<f64>]) -> Self {
        let (means, scales) = columns
            .iter()
            .map(|values| {
                let n = values.len().max(1) as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                (mean, if std > 0.0 { std } else { 1.0 })
            })
            .unzip();
        Self { means, scales }
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Scale column-major values and return row-major feature vectors.
    pub fn transform(&self, columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let n_rows = columns.first().map_or(0, |c| c.len());
        (0..n_rows)
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(j, values)| (values[row] - self.means[j]) / self.scales[j])
                    .collect()
            })
            .collect()
    }
}

/// Fitted preprocessing state
#[derive(Debug, Clone)]
struct FittedPipeline {
    columns: Vec<String>,
    imputer: MeanImputer,
    scaler: StandardScaler,
}

/// Imputer + scaler + outlier model over a numeric DataFrame.
pub struct AnomalyDetector {
    model: Box<dyn OutlierModel>,
    contamination: f64,
    fitted: Option<FittedPipeline>,
}

impl std::fmt::Debug for AnomalyDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyDetector")
            .field("contamination", &self.contamination)
            .field("fitted", &self.fitted)
            .finish_non_exhaustive()
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAMINATION)
    }
}

impl AnomalyDetector {
    /// Detector backed by an isolation forest with the default seed and tree count.
    pub fn new(contamination: f64) -> Self {
        Self::with_forest(contamination, DEFAULT_RANDOM_SEED, DEFAULT_N_ESTIMATORS)
    }

    /// Detector backed by an isolation forest with an explicit seed and tree count.
    pub fn with_forest(contamination: f64, seed: u64, n_estimators: usize) -> Self {
        let config = IsolationForestConfig::default()
            .contamination(contamination)
            .seed(seed)
            .n_estimators(n_estimators);
        Self::with_model(contamination, Box::new(IsolationForest::new(config)))
    }

    /// Detector backed by any outlier model.
    pub fn with_model(contamination: f64, model: Box<dyn OutlierModel>) -> Self {
        Self {
            model,
            contamination,
            fitted: None,
        }
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Learn imputer, scaler and model from a numeric-only DataFrame.
    pub fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let columns = column_names(df);
        if columns.is_empty() {
            return Err(AnalyzerError::Computation(
                "No numeric columns to fit the anomaly detector on".to_string(),
            ));
        }

        let raw = extract_columns(df, &columns)?;
        let imputer = MeanImputer::fit(&raw);
        let imputed = imputer.transform(&raw);
        let scaler = StandardScaler::fit(&imputed);
        let features = scaler.transform(&imputed);

        self.model.fit(&features)?;
        debug!(rows = df.height(), columns = ?columns, "anomaly detector fitted");

        self.fitted = Some(FittedPipeline {
            columns,
            imputer,
            scaler,
        });
        Ok(())
    }

    /// [`ANOMALY`] / [`NORMAL`] label per row, using the fitted pipeline.
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<i8>> {
        let features = self.prepare(df)?;
        self.model.predict(&features)
    }

    /// Decision-function score per row, lower is more anomalous.
    pub fn score(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let features = self.prepare(df)?;
        self.model.score(&features)
    }

    fn prepare(&self, df: &DataFrame) -> Result<Vec<Vec<f64>>> {
        let fitted = self.fitted.as_ref().ok_or(AnalyzerError::NotFitted)?;

        let actual = column_names(df);
        if actual != fitted.columns {
            return Err(AnalyzerError::FeatureMismatch {
                expected: fitted.columns.clone(),
                actual,
            });
        }

        let raw = extract_columns(df, &fitted.columns)?;
        Ok(fitted.scaler.transform(&fitted.imputer.transform(&raw)))
    }
}

fn extract_columns(df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    columns
        .iter()
        .map(|name| column_as_f64(df, name))
        .collect()
}
