//! Inference boundary: the scaler / classifier pair and its process-wide cache.

pub mod artifacts;
pub mod classifier;
pub mod fetch;
pub mod scaler;

use std::sync::Arc;

use ndarray::Array2;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::{data::RecordSchema, error::PipelineError, pipeline::FeatureTable};

pub use artifacts::{ArtifactError, ArtifactModel, ArtifactSource, CLASSIFIER_FILE, SCALER_FILE};
pub use fetch::FetchPolicy;

/// Outcome predicted for one appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Prediction {
    NoShow,
    Attended,
}

impl Prediction {
    pub fn from_class(class: usize) -> Option<Self> {
        match class {
            0 => Some(Self::NoShow),
            1 => Some(Self::Attended),
            _ => None,
        }
    }

    pub fn class(self) -> u8 {
        match self {
            Self::NoShow => 0,
            Self::Attended => 1,
        }
    }

    /// Domain label written to the output table.
    pub fn label(self, schema: &RecordSchema) -> &str {
        match self {
            Self::NoShow => schema.no_show_label.as_str(),
            Self::Attended => schema.attended_label.as_str(),
        }
    }
}

/// Two-step contract every model backend satisfies.
///
/// Both steps leave their input untouched and return exactly one output row per
/// input row, in input order.
pub trait InferenceAdapter: Send + Sync {
    /// Scale the canonical feature table into a dense matrix.
    fn normalize(&self, features: &FeatureTable) -> Result<Array2<f64>, PipelineError>;

    /// Predict one class per matrix row.
    fn classify(&self, matrix: &Array2<f64>) -> Result<Vec<Prediction>, PipelineError>;
}

/// Lazily loaded, shared model.
///
/// Concurrent first callers wait on a single load. A failed load leaves the
/// cache empty, so the next caller tries again.
pub struct ModelRegistry {
    source: Option<ArtifactSource>,
    feature_order: Vec<String>,
    cell: OnceCell<Arc<dyn InferenceAdapter>>,
}

impl ModelRegistry {
    pub fn new(source: ArtifactSource, schema: &RecordSchema) -> Self {
        Self {
            source: Some(source),
            feature_order: schema.feature_order.clone(),
            cell: OnceCell::new(),
        }
    }

    /// Registry around an adapter built elsewhere.
    pub fn with_model(model: Arc<dyn InferenceAdapter>) -> Self {
        Self {
            source: None,
            feature_order: Vec::new(),
            cell: OnceCell::new_with(Some(model)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub fn source(&self) -> Option<&ArtifactSource> {
        self.source.as_ref()
    }

    pub async fn get(&self) -> Result<Arc<dyn InferenceAdapter>, PipelineError> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let source = self.source.as_ref().ok_or(ArtifactError::NotConfigured)?;
                info!(source = %source.describe(), "loading model artifacts");
                let model = artifacts::load(source, &self.feature_order).await?;
                Ok::<_, ArtifactError>(Arc::new(model) as Arc<dyn InferenceAdapter>)
            })
            .await
            .map_err(|err| {
                error!(%err, "model artifacts unavailable");
                err
            })?;
        Ok(Arc::clone(model))
    }
}
