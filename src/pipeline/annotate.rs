//! Merge predicted classes back onto the retained columns.

use polars::prelude::{DataFrame, NamedFrom, Series};

use crate::{data::RecordSchema, error::PipelineError, model::Prediction};

/// Append the prediction column to `identifiers`, one label per row.
pub fn annotate(
    mut identifiers: DataFrame,
    predictions: &[Prediction],
    schema: &RecordSchema,
) -> Result<DataFrame, PipelineError> {
    if identifiers.height() != predictions.len() {
        return Err(PipelineError::Processing(format!(
            "{} predictions for {} records",
            predictions.len(),
            identifiers.height()
        )));
    }
    let labels: Vec<&str> = predictions
        .iter()
        .map(|prediction| prediction.label(schema))
        .collect();
    identifiers.with_column(Series::new(
        schema.prediction_column.as_str().into(),
        labels,
    ))?;
    Ok(identifiers)
}
