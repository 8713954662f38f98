//! Benford analyzer
//!
//! Stores uploaded CSV datasets and runs three analyses over them: a
//! first-digit test against Benford's law, isolation-forest anomaly
//! detection, and correlation-based column reduction.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod service;
pub mod store;
pub mod utils;

pub use config::ServiceConfig;
pub use error::{AnalyzerError, ErrorKind, Result};
pub use service::{AnalysisService, ApiError};
