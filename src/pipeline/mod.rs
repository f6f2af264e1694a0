//! Record preprocessing and prediction annotation.
//!
//! An upload moves through `split` (null filter, identifier / feature
//! partition), `prepare` (rename, schema check, reorder), inference and
//! `annotate`. A schema failure stops the run before any model call and no
//! partial table is ever returned.

pub mod annotate;
pub mod features;
pub mod mapper;
pub mod splitter;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    data::RecordSchema,
    error::PipelineError,
    model::{InferenceAdapter, ModelRegistry, Prediction},
};

pub use features::FeatureTable;

/// Counters describing one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows_received: usize,
    pub rows_dropped: usize,
    pub rows_predicted: usize,
    pub attended: usize,
    pub no_show: usize,
}

/// The annotated table plus its counters.
#[derive(Debug, Clone)]
pub struct AnnotatedResult {
    pub table: DataFrame,
    pub summary: RunSummary,
}

/// A validated upload waiting for the model.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    identifiers: DataFrame,
    features: FeatureTable,
    summary: RunSummary,
}

impl PreparedBatch {
    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn identifiers(&self) -> &DataFrame {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.features.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the model and attach its labels to the identifier columns.
    pub fn predict(
        self,
        model: &dyn InferenceAdapter,
        schema: &RecordSchema,
    ) -> Result<AnnotatedResult, PipelineError> {
        let predictions = if self.is_empty() {
            debug!("no complete rows; skipping inference");
            Vec::new()
        } else {
            infer(model, &self.features)?
        };

        let mut summary = self.summary;
        summary.rows_predicted = predictions.len();
        summary.attended = predictions
            .iter()
            .filter(|p| **p == Prediction::Attended)
            .count();
        summary.no_show = summary.rows_predicted - summary.attended;

        let table = annotate::annotate(self.identifiers, &predictions, schema)?;
        info!(
            rows = summary.rows_predicted,
            attended = summary.attended,
            no_show = summary.no_show,
            "annotated predictions"
        );
        Ok(AnnotatedResult { table, summary })
    }
}

fn infer(
    model: &dyn InferenceAdapter,
    features: &FeatureTable,
) -> Result<Vec<Prediction>, PipelineError> {
    let matrix = model.normalize(features)?;
    if matrix.nrows() != features.height() {
        return Err(PipelineError::Processing(format!(
            "normalisation returned {} rows for {} records",
            matrix.nrows(),
            features.height()
        )));
    }
    let predictions = model.classify(&matrix)?;
    if predictions.len() != matrix.nrows() {
        return Err(PipelineError::Processing(format!(
            "classifier returned {} labels for {} rows",
            predictions.len(),
            matrix.nrows()
        )));
    }
    Ok(predictions)
}

/// Validate an upload without touching the model.
#[instrument(skip_all, fields(rows = raw.height(), columns = raw.width()))]
pub fn prepare(raw: &DataFrame, schema: &RecordSchema) -> Result<PreparedBatch, PipelineError> {
    let split = splitter::split(raw, schema)?;
    let features = features::prepare(split.features, schema)?;
    Ok(PreparedBatch {
        identifiers: split.identifiers,
        features,
        summary: RunSummary {
            rows_received: raw.height(),
            rows_dropped: split.dropped_rows,
            ..RunSummary::default()
        },
    })
}

/// Full run against an already obtained model.
pub fn run(
    raw: &DataFrame,
    schema: &RecordSchema,
    model: &dyn InferenceAdapter,
) -> Result<AnnotatedResult, PipelineError> {
    prepare(raw, schema)?.predict(model, schema)
}

/// Full run that obtains the model from the registry after validation passes.
pub async fn run_with_registry(
    raw: &DataFrame,
    schema: &RecordSchema,
    registry: &ModelRegistry,
) -> Result<AnnotatedResult, PipelineError> {
    let batch = prepare(raw, schema)?;
    let model = registry.get().await?;
    batch.predict(model.as_ref(), schema)
}
