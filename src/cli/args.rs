//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ServiceConfig;

/// Benford analyzer - first-digit tests, anomaly detection and correlation
/// pruning over stored CSV datasets
#[derive(Parser, Debug)]
#[command(name = "benford")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory where uploaded and derived datasets are stored
    #[arg(long, global = true, env = "BENFORD_STORE_DIR", default_value = "downloads")]
    pub store_dir: PathBuf,

    /// Number of rows to use for CSV schema inference.
    /// Use 0 for full table scan (slow for large files).
    #[arg(
        long,
        global = true,
        env = "BENFORD_INFER_SCHEMA_LENGTH",
        default_value = "10000"
    )]
    pub infer_schema_length: usize,

    /// Identifier columns excluded from anomaly detection (comma-separated)
    #[arg(
        long,
        global = true,
        env = "BENFORD_IDENTIFIER_COLUMNS",
        value_delimiter = ',',
        default_value = "TransactionID,CustomerID"
    )]
    pub identifier_columns: Vec<String>,

    /// Contamination used when a request does not give one (0 < c <= 0.5)
    #[arg(
        long,
        global = true,
        env = "BENFORD_CONTAMINATION",
        default_value = "0.05",
        value_parser = validate_contamination
    )]
    pub default_contamination: f64,

    /// Seed for the isolation forest
    #[arg(long, global = true, env = "BENFORD_SEED", default_value = "42")]
    pub seed: u64,

    /// Number of isolation trees
    #[arg(
        long,
        global = true,
        env = "BENFORD_N_ESTIMATORS",
        default_value = "100",
        value_parser = validate_n_estimators
    )]
    pub n_estimators: usize,

    /// Print raw JSON responses instead of tables
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a CSV file and store it, printing the new dataset ID
    Upload {
        /// CSV file to upload
        file: PathBuf,
    },

    /// Compare a column's leading digits against Benford's law
    Benford {
        /// Dataset ID
        #[arg(long)]
        id: Option<String>,

        /// Column to analyze
        #[arg(short, long)]
        column: Option<String>,

        /// Write the SVG chart to this path
        #[arg(long)]
        plot_out: Option<PathBuf>,
    },

    /// Flag anomalous rows with an isolation forest
    Anomalies {
        /// Dataset ID
        #[arg(long)]
        id: Option<String>,

        /// Expected fraction of anomalies (0 < c <= 0.5)
        #[arg(long, value_parser = validate_contamination)]
        contamination: Option<f64>,
    },

    /// Correlation-based column reduction
    Correlation {
        #[command(subcommand)]
        action: CorrelationCommand,
    },

    /// Show row count, columns, head and tail of a dataset
    Visualize {
        /// Dataset ID
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CorrelationCommand {
    /// List the columns that would be removed
    Preview(CorrelationArgs),

    /// Remove correlated columns and store the result as a new dataset
    Apply(CorrelationArgs),

    /// Mean and maximum pairwise correlations
    Stats {
        /// Dataset ID
        #[arg(long)]
        id: Option<String>,

        /// Correlation method: pearson, spearman or kendall
        #[arg(long)]
        method: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct CorrelationArgs {
    /// Dataset ID
    #[arg(long)]
    pub id: Option<String>,

    /// Absolute correlation at or above which two columns are grouped (0 to 1)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Correlation method: pearson, spearman or kendall
    #[arg(long)]
    pub method: Option<String>,

    /// Which group member survives: variance, missing_values or cardinality
    #[arg(long)]
    pub selection_method: Option<String>,
}

impl Cli {
    /// Service configuration from the global flags
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            store_dir: self.store_dir.clone(),
            infer_schema_length: self.infer_schema_length,
            identifier_columns: self
                .identifier_columns
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            default_contamination: self.default_contamination,
            random_seed: self.seed,
            n_estimators: self.n_estimators,
        }
    }
}

/// Validator for contamination parameters
fn validate_contamination(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value <= 0.5 {
        Ok(value)
    } else {
        Err(format!(
            "contamination must be in (0.0, 0.5], got {}",
            value
        ))
    }
}

/// Validator for n_estimators parameter
fn validate_n_estimators(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid tree count", s))?;

    if value == 0 {
        Err("n_estimators must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
