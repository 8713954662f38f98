//! Dataset store: one versioned blob per dataset under a storage directory,
//! keyed by a random identifier. The directory listing is the only index.

pub mod codec;

pub use codec::CodecError;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DEFAULT_INFER_SCHEMA_LENGTH;
use crate::error::{AnalyzerError, Result};
use crate::pipeline::loader::{column_names, parse_csv_bytes, render_rows};

/// Number of rows returned at each end of a dataset summary
pub const PREVIEW_ROWS: usize = 5;

/// Opaque dataset identifier: a random 128-bit UUID in canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(Uuid);

impl DatasetId {
    /// Fresh random identifier, independent of any content
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DatasetId {
    type Err = AnalyzerError;

    /// Anything that is not a UUID can never have been issued by the store.
    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| AnalyzerError::DatasetNotFound(s.to_string()))
    }
}

/// Row count, column names and both ends of a dataset, rendered for transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub length: usize,
    pub columns: Vec<String>,
    pub head: Vec<Vec<String>>,
    pub tail: Vec<Vec<String>>,
}

/// Filesystem-backed dataset store.
///
/// Reads and writes are not coordinated: concurrent writers to the same id race.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
    infer_schema_length: usize,
}

impl DatasetStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        info!(path = %root.display(), "dataset store ready");
        Ok(Self {
            root,
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
        })
    }

    /// Set the number of rows used for CSV schema inference (0 = full scan).
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &DatasetId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Parse raw CSV bytes and persist the resulting dataset.
    pub fn store_bytes(&self, raw: &[u8]) -> Result<DatasetId> {
        let df = parse_csv_bytes(raw, self.infer_schema_length)?;
        let (rows, cols) = df.shape();
        debug!(rows, cols, "parsed uploaded dataset");
        self.store(&df)
    }

    /// Persist an in-memory dataset under a fresh identifier.
    pub fn store(&self, df: &DataFrame) -> Result<DatasetId> {
        let id = DatasetId::generate();
        let blob = codec::encode(df)?;
        std::fs::write(self.path_for(&id), blob)?;
        info!(%id, rows = df.height(), cols = df.width(), "stored dataset");
        Ok(id)
    }

    /// Load a dataset by identifier.
    pub fn retrieve(&self, id: &DatasetId) -> Result<DataFrame> {
        let bytes = match std::fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AnalyzerError::DatasetNotFound(id.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(codec::decode(&bytes)?)
    }

    /// Load a dataset by its string identifier.
    pub fn retrieve_str(&self, id: &str) -> Result<DataFrame> {
        self.retrieve(&id.parse()?)
    }

    /// Row count, columns and the first/last [`PREVIEW_ROWS`] rows of a dataset.
    pub fn summarize(&self, id: &DatasetId) -> Result<DatasetSummary> {
        let df = self.retrieve(id)?;
        Ok(DatasetSummary {
            length: df.height(),
            columns: column_names(&df),
            head: render_rows(&df.head(Some(PREVIEW_ROWS)))?,
            tail: render_rows(&df.tail(Some(PREVIEW_ROWS)))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dataset_id_display_round_trip() {
        let id = DatasetId::generate();
        let parsed: DatasetId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn test_non_uuid_is_not_found() {
        let err = "../etc/passwd".parse::<DatasetId>().unwrap_err();
        assert!(matches!(err, AnalyzerError::DatasetNotFound(_)));
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("downloads");
        let store = DatasetStore::open(&root).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn test_one_file_per_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        let id = store.store_bytes(b"a,b\n1,2\n").unwrap();
        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();

        assert_eq!(entries, vec![id.to_string()]);
    }
}
