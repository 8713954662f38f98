//! Service configuration

use std::path::PathBuf;

/// Default expected fraction of anomalous rows
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Default seed for the outlier model
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default number of isolation trees
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default number of rows used for CSV schema inference
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Columns that carry no statistical signal and are never fed to the outlier model
pub const DEFAULT_IDENTIFIER_COLUMNS: [&str; 2] = ["TransactionID", "CustomerID"];

/// Runtime configuration for [`crate::service::AnalysisService`].
///
/// Built once at process start (see `main.rs`) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Directory holding one file per stored dataset
    pub store_dir: PathBuf,
    /// Rows used for CSV type inference. 0 means full table scan.
    pub infer_schema_length: usize,
    /// Identifier-like columns excluded from anomaly detection
    pub identifier_columns: Vec<String>,
    /// Contamination used when a request does not specify one
    pub default_contamination: f64,
    pub random_seed: u64,
    pub n_estimators: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("downloads"),
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
            identifier_columns: DEFAULT_IDENTIFIER_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_contamination: DEFAULT_CONTAMINATION,
            random_seed: DEFAULT_RANDOM_SEED,
            n_estimators: DEFAULT_N_ESTIMATORS,
        }
    }
}

impl ServiceConfig {
    /// Configuration rooted at a specific store directory, defaults elsewhere
    pub fn with_store_dir(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            ..Default::default()
        }
    }
}
