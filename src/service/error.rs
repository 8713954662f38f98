//! Boundary error taxonomy

use serde::{Deserialize, Serialize};

/// Failure reported by a service operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("File has no name")]
    FileNotNamed,

    #[error("Failed to store the uploaded dataset")]
    StoreFailure,

    #[error("Missing required parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("No ID provided")]
    MissingId,

    #[error("Dataset not found")]
    DatasetNotFound,

    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    #[error("Invalid correlation settings")]
    InvalidSettings,

    #[error("No numeric columns available for anomaly detection")]
    NoNumericData,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to fetch the dataset")]
    FetchFailure,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Serializable error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ApiError {
    /// HTTP-equivalent status code
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NoFileSelected
            | ApiError::FileNotNamed
            | ApiError::MissingParameter(_)
            | ApiError::ColumnNotFound(_)
            | ApiError::InvalidSettings
            | ApiError::NoNumericData
            | ApiError::Validation(_) => 400,
            ApiError::MissingId => 401,
            ApiError::DatasetNotFound => 404,
            ApiError::StoreFailure | ApiError::FetchFailure | ApiError::Internal { .. } => 500,
        }
    }

    /// Stable machine-readable code for the variant
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NoFileSelected => "no_file_selected",
            ApiError::FileNotNamed => "file_not_named",
            ApiError::StoreFailure => "store_failure",
            ApiError::MissingParameter(_) => "missing_parameter",
            ApiError::MissingId => "missing_id",
            ApiError::DatasetNotFound => "dataset_not_found",
            ApiError::ColumnNotFound(_) => "column_not_found",
            ApiError::InvalidSettings => "invalid_settings",
            ApiError::NoNumericData => "no_numeric_data",
            ApiError::Validation(_) => "validation",
            ApiError::FetchFailure => "fetch_failure",
            ApiError::Internal { .. } => "internal",
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        }
    }
}
