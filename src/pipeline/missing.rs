//! Missing value analysis

use polars::prelude::*;

use crate::error::Result;
use crate::pipeline::loader::column_as_f64;

/// Count missing values per column, in column order.
///
/// Nulls are missing for every dtype; float columns also count NaN.
pub fn missing_counts(df: &DataFrame) -> Result<Vec<(String, usize)>> {
    let mut counts = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let name = column.name().to_string();
        let count = if column.dtype().is_float() {
            column_as_f64(df, &name)?
                .iter()
                .filter(|v| v.is_none())
                .count()
        } else {
            column.null_count()
        };
        counts.push((name, count));
    }

    Ok(counts)
}
