//! Error types shared by the store and the analyzers.

use polars::prelude::PolarsError;

use crate::store::CodecError;

/// Coarse classification of an [`AnalyzerError`], used at the service boundary
/// to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing parameters, invalid settings.
    Validation,
    /// Unknown dataset id or missing column.
    NotFound,
    /// The analysis cannot run on the given data.
    Computation,
    /// Anything unexpected from storage or the numeric code.
    Internal,
}

/// Errors produced by the dataset store and the analyzers.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Invalid parameter: {0}")]
    Validation(String),

    #[error("No dataset found for ID: {0}")]
    DatasetNotFound(String),

    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    #[error("Failed to parse tabular data: {0}")]
    Parse(String),

    #[error("{0}")]
    Computation(String),

    #[error("Model has not been fitted; call fit before predict or score")]
    NotFitted,

    #[error("Feature mismatch: model was fitted on {expected:?}, got {actual:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Stored dataset is corrupt: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataframe error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Statistics error: {0}")]
    Stats(String),
}

impl AnalyzerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzerError::Validation(_) => ErrorKind::Validation,
            AnalyzerError::DatasetNotFound(_) | AnalyzerError::ColumnNotFound(_) => {
                ErrorKind::NotFound
            }
            AnalyzerError::Computation(_) | AnalyzerError::FeatureMismatch { .. } => {
                ErrorKind::Computation
            }
            AnalyzerError::Parse(_)
            | AnalyzerError::NotFitted
            | AnalyzerError::Codec(_)
            | AnalyzerError::Io(_)
            | AnalyzerError::Polars(_)
            | AnalyzerError::Stats(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
