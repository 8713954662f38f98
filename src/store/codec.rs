//! Versioned on-disk format for stored datasets.
//!
//! ```text
//! offset 0  : magic  b"BFDS"            (4 bytes)
//! offset 4  : format version, u16 LE
//! offset 6  : written-at, i64 LE, Unix milliseconds
//! offset 14 : Parquet payload (column names, types, values, nulls)
//! ```
//!
//! The Parquet payload carries the schema explicitly, so decoding never has to
//! guess types and missing-value positions survive the round trip.

use std::io::Cursor;

use polars::prelude::*;

/// Magic bytes at the start of every stored dataset
pub const MAGIC: &[u8; 4] = b"BFDS";

/// Current format version
pub const FORMAT_VERSION: u16 = 1;

/// Size of the fixed header preceding the payload
pub const HEADER_LEN: usize = 14;

/// Errors that can occur when encoding or decoding a stored dataset.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Blob does not start with [`MAGIC`].
    #[error("Invalid dataset blob: magic number mismatch")]
    InvalidMagic,

    /// Blob is shorter than the fixed header.
    #[error(
        "Truncated dataset blob: expected at least {len} bytes, found {actual}",
        len = HEADER_LEN
    )]
    Truncated {
        /// Bytes available
        actual: usize,
    },

    /// Header carries a version this build cannot read.
    #[error("Unsupported dataset format version {0}")]
    UnsupportedVersion(u16),

    /// Parquet payload could not be written or read.
    #[error("Dataset payload error: {0}")]
    Payload(#[source] PolarsError),
}

/// Header of a decoded blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobHeader {
    pub version: u16,
    pub written_at_ms: i64,
}

/// Serialize a dataset into the versioned blob format.
pub fn encode(df: &DataFrame) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(HEADER_LEN + df.estimated_size());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&chrono::Utc::now().timestamp_millis().to_le_bytes());

    // ParquetWriter needs a mutable frame; the caller's copy stays untouched
    let mut payload = df.clone();
    ParquetWriter::new(&mut buf)
        .finish(&mut payload)
        .map_err(CodecError::Payload)?;

    Ok(buf)
}

/// Parse and validate the fixed header.
pub fn read_header(bytes: &[u8]) -> Result<BlobHeader, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated {
            actual: bytes.len(),
        });
    }
    if &bytes[0..4] != MAGIC {
        return Err(CodecError::InvalidMagic);
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let mut ts = [0u8; 8];
    ts.copy_from_slice(&bytes[6..HEADER_LEN]);

    Ok(BlobHeader {
        version,
        written_at_ms: i64::from_le_bytes(ts),
    })
}

/// Deserialize a blob produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<DataFrame, CodecError> {
    read_header(bytes)?;

    ParquetReader::new(Cursor::new(bytes[HEADER_LEN..].to_vec()))
        .finish()
        .map_err(CodecError::Payload)
}
