//! Canonical feature table preparation.

use indexmap::IndexMap;
use ndarray::Array2;
use polars::prelude::{DataFrame, DataType};
use tracing::debug;

use crate::{data::RecordSchema, error::PipelineError, pipeline::mapper};

/// Category label to numeric code, per feature.
pub type Encodings = IndexMap<String, IndexMap<String, f64>>;

/// Feature columns renamed and ordered exactly as the model expects.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    frame: DataFrame,
}

impl FeatureTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Dense row-major matrix of the feature values.
    ///
    /// Numeric, boolean and temporal columns are cast to `f64`. Text cells are
    /// looked up in `encodings`; a text value without a code is rejected, and so
    /// is any NaN or infinite cell.
    pub fn to_matrix(&self, encodings: &Encodings) -> Result<Array2<f64>, PipelineError> {
        let mut matrix = Array2::<f64>::zeros((self.height(), self.width()));
        for (col_idx, series) in self.frame.get_columns().iter().enumerate() {
            let name = series.name().to_string();
            let mut column = matrix.column_mut(col_idx);
            if matches!(series.dtype(), DataType::String) {
                let codes = encodings.get(&name);
                for (row_idx, value) in series.str()?.into_iter().enumerate() {
                    let value = value.ok_or_else(|| null_cell(&name, row_idx))?;
                    let code = codes
                        .and_then(|codes| codes.get(value.trim()))
                        .copied()
                        .or_else(|| {
                            value
                                .trim()
                                .parse::<f64>()
                                .ok()
                                .filter(|parsed| parsed.is_finite())
                        })
                        .ok_or_else(|| {
                            PipelineError::MalformedInput(format!(
                                "column `{name}` holds unrecognised value `{value}`"
                            ))
                        })?;
                    column[row_idx] = code;
                }
            } else {
                let cast = series.cast(&DataType::Float64).map_err(|err| {
                    PipelineError::MalformedInput(format!("column `{name}` is not numeric: {err}"))
                })?;
                for (row_idx, value) in cast.f64()?.into_iter().enumerate() {
                    let value = value.ok_or_else(|| null_cell(&name, row_idx))?;
                    if !value.is_finite() {
                        return Err(PipelineError::MalformedInput(format!(
                            "column `{name}` holds non-finite value `{value}` on row {row_idx}"
                        )));
                    }
                    column[row_idx] = value;
                }
            }
        }
        Ok(matrix)
    }
}

fn null_cell(column: &str, row: usize) -> PipelineError {
    PipelineError::MalformedInput(format!("column `{column}` has no value on row {row}"))
}

/// Rename to canonical names, require every feature, and fix the column order.
pub fn prepare(features: DataFrame, schema: &RecordSchema) -> Result<FeatureTable, PipelineError> {
    let renamed = mapper::rename_columns(features, &schema.renames)?;

    let missing: Vec<String> = schema
        .feature_order
        .iter()
        .filter(|name| renamed.get_column_index(name).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingFeatureColumns(missing));
    }

    let frame = renamed.select(schema.feature_order.iter().map(String::as_str))?;
    debug!(columns = frame.width(), rows = frame.height(), "prepared feature table");
    Ok(FeatureTable { frame })
}
