//! Null filtering and the identifier / feature partition.

use polars::prelude::{BooleanChunked, ChunkFull, DataFrame};
use tracing::{debug, warn};

use crate::{data::RecordSchema, error::PipelineError};

/// The two halves of an uploaded table, aligned row by row.
#[derive(Debug, Clone)]
pub struct SplitRecords {
    /// Identifier and extra retained columns, in schema order.
    pub identifiers: DataFrame,
    /// Everything left after removing the exclusion set.
    pub features: DataFrame,
    /// Rows discarded because some cell was null or NaN.
    pub dropped_rows: usize,
}

/// Drop incomplete rows, then split the survivors.
///
/// The null filter runs once on the whole table before the projections are
/// taken, so row `i` of `identifiers` and row `i` of `features` always describe
/// the same appointment.
pub fn split(raw: &DataFrame, schema: &RecordSchema) -> Result<SplitRecords, PipelineError> {
    let missing: Vec<String> = schema
        .retained_columns()
        .filter(|name| raw.get_column_index(name).is_none())
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingIdentifierColumns(missing));
    }

    let filtered = drop_incomplete_rows(raw)?;
    let dropped_rows = raw.height() - filtered.height();
    if dropped_rows > 0 {
        warn!(dropped_rows, kept = filtered.height(), "dropped rows with empty cells");
    }

    let identifiers = filtered.select(schema.retained_columns())?;

    let mut features = filtered;
    for name in schema.exclusion_set() {
        if features.get_column_index(name).is_some() {
            features = features.drop(name)?;
        }
    }
    debug!(
        identifiers = identifiers.width(),
        features = features.width(),
        rows = features.height(),
        "split records"
    );

    Ok(SplitRecords {
        identifiers,
        features,
        dropped_rows,
    })
}

/// Keep only rows where every column holds a value.
///
/// Float NaN counts as missing, the same as null.
pub fn drop_incomplete_rows(frame: &DataFrame) -> Result<DataFrame, PipelineError> {
    let mut mask = BooleanChunked::full("complete".into(), true, frame.height());
    for series in frame.get_columns() {
        mask = &mask & &series.is_not_null();
        if series.dtype().is_float() {
            mask = &mask & &series.is_not_nan()?;
        }
    }
    Ok(frame.filter(&mask)?)
}
