//! Dataset loader: CSV bytes into a DataFrame, plus cell access helpers
//! shared by the analyzers and the store summary.

use std::io::Cursor;

use polars::prelude::*;
use serde_json::Value;

use crate::error::{AnalyzerError, Result};

/// Marker used for missing values when rows are rendered for transport
pub const MISSING_MARKER: &str = "NaN";

/// Cell tokens read as missing, in addition to empty fields
pub const NULL_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parse delimited tabular bytes (CSV with a header row) into a DataFrame.
///
/// Empty fields and any of [`NULL_TOKENS`] are missing, so a numeric column
/// with `NA` cells is still inferred as numeric.
///
/// # Arguments
/// * `bytes` - Raw uploaded file contents
/// * `infer_schema_length` - Rows used for type inference, 0 for a full scan
pub fn parse_csv_bytes(bytes: &[u8], infer_schema_length: usize) -> Result<DataFrame> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(AnalyzerError::Parse("input is empty".to_string()));
    }

    // Convert schema length: 0 means full scan
    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|t| (*t).into()).collect());

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(schema_length)
        .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| AnalyzerError::Parse(e.to_string()))
}

/// Ordered column names of a DataFrame
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Names of primitive numeric columns (integers and floats, never booleans or strings)
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric())
        .map(|col| col.name().to_string())
        .collect()
}

/// Restrict a DataFrame to its numeric columns, minus the excluded names.
pub fn select_numeric_features(df: &DataFrame, exclude: &[String]) -> Result<DataFrame> {
    let keep: Vec<String> = numeric_column_names(df)
        .into_iter()
        .filter(|name| !exclude.contains(name))
        .collect();

    Ok(df.select(keep.iter().map(|s| s.as_str()))?)
}

/// Read a column as `f64`, mapping nulls and NaN to `None`.
pub fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| AnalyzerError::ColumnNotFound(name.to_string()))?;
    let float_col = column.cast(&DataType::Float64)?;
    let ca = float_col.f64()?;

    Ok(ca
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Canonical decimal rendering of a float.
///
/// Integral values keep one decimal place (`3.0`), everything else uses the
/// shortest round-trip form. NaN is treated as missing.
pub fn format_float(value: f64) -> Option<String> {
    if value.is_nan() {
        None
    } else if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        Some(format!("{:.1}", value))
    } else {
        Some(format!("{}", value))
    }
}

/// Render a cell as a string, `None` when the value is missing.
pub fn render_value(value: &AnyValue) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::Float64(v) => format_float(*v),
        AnyValue::Float32(v) => format_float(*v as f64),
        AnyValue::Boolean(b) => Some(if *b { "True" } else { "False" }.to_string()),
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        other => Some(other.to_string()),
    }
}

/// Render a cell for transport, using [`MISSING_MARKER`] for missing values.
pub fn render_cell(value: &AnyValue) -> String {
    render_value(value).unwrap_or_else(|| MISSING_MARKER.to_string())
}

/// Render rows of a DataFrame as strings with explicit missing markers.
pub fn render_rows(df: &DataFrame) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let mut row = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            row.push(render_cell(&column.get(row_idx)?));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Convert a cell into a JSON value. Missing values and NaN become `null`.
pub fn value_to_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => float_to_json(*v as f64),
        AnyValue::Float64(v) => float_to_json(*v),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => Value::String(other.to_string()),
    }
}

/// JSON number for finite floats, `null` otherwise
pub fn float_to_json(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Convert one row into an ordered JSON object keyed by column name.
pub fn row_to_json(df: &DataFrame, row_idx: usize) -> Result<serde_json::Map<String, Value>> {
    let mut record = serde_json::Map::with_capacity(df.width());
    for column in df.get_columns() {
        record.insert(column.name().to_string(), value_to_json(&column.get(row_idx)?));
    }
    Ok(record)
}
