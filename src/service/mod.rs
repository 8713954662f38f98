//! Boundary operations: the transport-independent contract a router maps
//! endpoints onto.
//!
//! Requests carry every parameter as an `Option` so that a missing value is
//! reported as a validation failure rather than a decoding error. Every
//! failure leaves through [`ApiError`], which knows its HTTP-equivalent status.

mod error;
mod types;

pub use error::{ApiError, ErrorBody};
pub use types::*;

use polars::prelude::*;
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::error::{AnalyzerError, ErrorKind, Result};
use crate::pipeline::{
    float_to_json, row_to_json, select_numeric_features, AnomalyDetector, BenfordAnalyzer,
    CorrelationAnalyzer, CorrelationMethod, SelectionMethod, ANOMALY,
};
use crate::report::chart::{encode_plot, render_benford_chart};
use crate::store::{DatasetId, DatasetStore, DatasetSummary};

/// Validated correlation settings
#[derive(Debug, Clone, Copy)]
struct CorrelationSettings {
    threshold: f64,
    method: CorrelationMethod,
    selection_method: SelectionMethod,
}

/// Dataset store plus analyzers, wired to the boundary contract.
#[derive(Debug)]
pub struct AnalysisService {
    config: ServiceConfig,
    store: DatasetStore,
    benford: BenfordAnalyzer,
    correlation: CorrelationAnalyzer,
}

impl AnalysisService {
    /// Open the store described by `config`. Called once before serving requests.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let store = DatasetStore::open(&config.store_dir)?
            .with_infer_schema_length(config.infer_schema_length);
        Ok(Self {
            config,
            store,
            benford: BenfordAnalyzer::new(),
            correlation: CorrelationAnalyzer::new(),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Parse and persist an uploaded CSV file.
    pub fn upload(&self, file: Option<UploadedFile>) -> std::result::Result<UploadResponse, ApiError> {
        let file = file.ok_or(ApiError::NoFileSelected)?;
        if file.filename.trim().is_empty() {
            return Err(ApiError::FileNotNamed);
        }

        match self.store.store_bytes(&file.bytes) {
            Ok(id) => {
                info!(%id, filename = %file.filename, bytes = file.bytes.len(), "upload stored");
                Ok(UploadResponse { id: id.to_string() })
            }
            Err(err) => {
                error!(filename = %file.filename, error = %err, "upload failed");
                Err(ApiError::StoreFailure)
            }
        }
    }

    /// First-digit analysis of one column, with the chart attached.
    pub fn analyze_benford(
        &self,
        request: BenfordRequest,
    ) -> std::result::Result<BenfordResponse, ApiError> {
        let id = require(request.id, "id")?;
        let column = require(request.column, "column")?;

        let df = self.load(&id)?;
        if df.column(&column).is_err() {
            warn!(%id, %column, "benford column missing");
            return Err(ApiError::ColumnNotFound(column));
        }

        let analysis = self
            .benford
            .analyze(&df, &column)
            .map_err(|e| map_error("analyze_benford", e))?;
        let svg = render_benford_chart(
            &analysis,
            &format!("Benford's law analysis for column '{}'", column),
        );

        info!(%id, %column, chi_stat = analysis.chi_stat, p_value = analysis.p_value, "benford analysis served");
        Ok(BenfordResponse {
            empirical_probs: analysis.empirical_probs,
            benford_probs: analysis.benford_probs,
            chi_stat: analysis.chi_stat,
            p_value: analysis.p_value,
            plot: encode_plot(&svg),
            total_count: analysis.total_count,
        })
    }

    /// Flag anomalous rows using the numeric, non-identifier columns.
    pub fn detect_anomalies(
        &self,
        request: AnomalyRequest,
    ) -> std::result::Result<AnomalyResponse, ApiError> {
        let id = require(request.id, "id")?;
        let contamination = request
            .contamination
            .unwrap_or(self.config.default_contamination);

        let df = self.load(&id)?;
        let features = select_numeric_features(&df, &self.config.identifier_columns)
            .map_err(|e| map_error("detect_anomalies", e))?;
        if features.width() == 0 {
            warn!(%id, "no numeric columns left after removing identifiers");
            return Err(ApiError::NoNumericData);
        }

        let mut detector = AnomalyDetector::with_forest(
            contamination,
            self.config.random_seed,
            self.config.n_estimators,
        );
        let (labels, scores) = detector
            .fit(&features)
            .and_then(|_| Ok((detector.predict(&features)?, detector.score(&features)?)))
            .map_err(|e| map_error("detect_anomalies", e))?;

        let anomalies = anomaly_records(&df, &labels, &scores)
            .map_err(|e| map_error("detect_anomalies", e))?;

        info!(%id, anomalies = anomalies.len(), rows = df.height(), contamination, "anomaly detection served");
        Ok(AnomalyResponse {
            anomaly_count: anomalies.len(),
            total_count: features.height(),
            anomalies,
        })
    }

    /// Columns correlation reduction would drop, without touching the dataset.
    pub fn preview_columns_to_remove(
        &self,
        request: CorrelationRequest,
    ) -> std::result::Result<ColumnsToRemoveResponse, ApiError> {
        let (id, df, settings) = self.resolve_correlation(request)?;
        let selector = self
            .correlation
            .select(
                &df,
                settings.threshold,
                settings.method,
                settings.selection_method,
            )
            .map_err(|e| map_error("preview_columns_to_remove", e))?;

        info!(%id, dropped = selector.features_to_drop().len(), "correlation preview served");
        Ok(ColumnsToRemoveResponse {
            columns_to_remove: selector.features_to_drop().to_vec(),
            groups: selector.correlated_groups().to_vec(),
        })
    }

    /// Remove correlated columns and store the result under a new identifier.
    pub fn apply_correlation_reduction(
        &self,
        request: CorrelationRequest,
    ) -> std::result::Result<UploadResponse, ApiError> {
        let (id, df, settings) = self.resolve_correlation(request)?;
        let reduced = self
            .correlation
            .process(
                &df,
                settings.threshold,
                settings.method,
                settings.selection_method,
            )
            .map_err(|e| map_error("apply_correlation_reduction", e))?;

        let new_id = self
            .store
            .store(&reduced)
            .map_err(|e| map_error("apply_correlation_reduction", e))?;

        info!(%id, %new_id, before = df.width(), after = reduced.width(), "correlation reduction stored");
        Ok(UploadResponse {
            id: new_id.to_string(),
        })
    }

    /// Average and maximum correlations of a dataset.
    pub fn correlation_statistics(
        &self,
        request: CorrelationStatisticsRequest,
    ) -> std::result::Result<CorrelationStatisticsResponse, ApiError> {
        let id = require(request.id, "id")?;
        let method = match request.method {
            Some(name) => name.parse().map_err(|_| ApiError::InvalidSettings)?,
            None => self.correlation.default_method,
        };

        let df = self.load(&id)?;
        let stats = self
            .correlation
            .correlation_statistics(&df, method)
            .map_err(|e| map_error("correlation_statistics", e))?;

        Ok(CorrelationStatisticsResponse {
            method: method.to_string(),
            average_correlation: stats.average_correlation,
            max_correlation: stats.max_correlation,
        })
    }

    /// Row count, columns, head and tail of a dataset.
    pub fn visualize(
        &self,
        request: VisualizeRequest,
    ) -> std::result::Result<DatasetSummary, ApiError> {
        let id = request.id.ok_or(ApiError::MissingId)?;

        id.parse::<DatasetId>()
            .and_then(|id| self.store.summarize(&id))
            .map_err(|err| {
                warn!(%id, error = %err, "could not fetch dataset for preview");
                ApiError::FetchFailure
            })
    }

    fn load(&self, id: &str) -> std::result::Result<DataFrame, ApiError> {
        self.store
            .retrieve_str(id)
            .map_err(|e| map_error("load_dataset", e))
    }

    fn resolve_correlation(
        &self,
        request: CorrelationRequest,
    ) -> std::result::Result<(String, DataFrame, CorrelationSettings), ApiError> {
        let id = require(request.id, "id")?;
        let threshold = require(request.threshold, "threshold")?;
        let method = require(request.method, "method")?;
        let selection_method = require(request.selection_method, "selection_method")?;

        let df = self.load(&id)?;

        if !self.correlation.validate(&method, threshold, &selection_method) {
            warn!(%id, %method, threshold, %selection_method, "invalid correlation settings");
            return Err(ApiError::InvalidSettings);
        }

        let settings = CorrelationSettings {
            threshold,
            method: method.parse().map_err(|_| ApiError::InvalidSettings)?,
            selection_method: selection_method
                .parse()
                .map_err(|_| ApiError::InvalidSettings)?,
        };
        Ok((id, df, settings))
    }
}

fn require<T>(value: Option<T>, name: &'static str) -> std::result::Result<T, ApiError> {
    value.ok_or(ApiError::MissingParameter(name))
}

/// Map an analyzer failure onto the boundary taxonomy, logging it on the way out.
fn map_error(operation: &'static str, err: AnalyzerError) -> ApiError {
    match (err.kind(), err) {
        (_, AnalyzerError::DatasetNotFound(id)) => {
            warn!(operation, %id, "dataset not found");
            ApiError::DatasetNotFound
        }
        (_, AnalyzerError::ColumnNotFound(column)) => {
            warn!(operation, %column, "column not found");
            ApiError::ColumnNotFound(column)
        }
        (ErrorKind::Validation | ErrorKind::Computation, err) => {
            warn!(operation, error = %err, "request rejected");
            ApiError::Validation(err.to_string())
        }
        (_, err) => {
            error!(operation, error = %err, "internal failure");
            ApiError::Internal {
                message: err.to_string(),
            }
        }
    }
}

/// Full original rows flagged as anomalous, with their label and score appended.
fn anomaly_records(df: &DataFrame, labels: &[i8], scores: &[f64]) -> Result<Vec<AnomalyRecord>> {
    let mut records = Vec::new();
    for (row_idx, (&label, &score)) in labels.iter().zip(scores).enumerate() {
        if label != ANOMALY {
            continue;
        }
        let mut record = row_to_json(df, row_idx)?;
        record.insert("Anomaly".to_string(), serde_json::Value::from(label));
        record.insert("Anomaly_Score".to_string(), float_to_json(score));
        records.push(record);
    }
    Ok(records)
}
