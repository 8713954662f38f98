//! Request and response payloads

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw uploaded file: name as sent by the client plus its bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenfordRequest {
    pub id: Option<String>,
    pub column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenfordResponse {
    pub empirical_probs: BTreeMap<u8, f64>,
    pub benford_probs: BTreeMap<u8, f64>,
    pub chi_stat: f64,
    pub p_value: f64,
    /// Base64-encoded SVG chart
    pub plot: String,
    /// Number of values that contributed a leading digit
    #[serde(default)]
    pub total_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyRequest {
    pub id: Option<String>,
    pub contamination: Option<f64>,
}

/// One anomalous row: original columns plus `Anomaly` and `Anomaly_Score`.
pub type AnomalyRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyResponse {
    pub anomalies: Vec<AnomalyRecord>,
    pub anomaly_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelationRequest {
    pub id: Option<String>,
    pub threshold: Option<f64>,
    pub method: Option<String>,
    pub selection_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsToRemoveResponse {
    pub columns_to_remove: Vec<String>,
    /// Correlated groups, kept member first
    #[serde(default)]
    pub groups: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizeRequest {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelationStatisticsRequest {
    pub id: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationStatisticsResponse {
    pub method: String,
    /// Mean signed correlation of each column with the others
    pub average_correlation: Vec<(String, f64)>,
    pub max_correlation: Option<f64>,
}
