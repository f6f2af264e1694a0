//! Error taxonomy shared by the pipeline, the CLI and the HTTP layer.

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::model::ArtifactError;

/// Every way a prediction request can fail.
///
/// `DependencyUnavailable` concerns the process (the model artifacts could not be
/// obtained); the remaining variants abort only the request at hand.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("model artifacts unavailable: {0}")]
    DependencyUnavailable(#[from] ArtifactError),

    #[error("missing identifier columns: {}", .0.join(", "))]
    MissingIdentifierColumns(Vec<String>),

    #[error("missing feature columns: {}", .0.join(", "))]
    MissingFeatureColumns(Vec<String>),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("processing failed: {0}")]
    Processing(String),
}

impl PipelineError {
    /// Stable machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DependencyUnavailable(_) => "dependency_unavailable",
            Self::MissingIdentifierColumns(_) => "missing_identifier_columns",
            Self::MissingFeatureColumns(_) => "missing_feature_columns",
            Self::MalformedInput(_) => "malformed_input",
            Self::Processing(_) => "processing",
        }
    }

    /// Column names the caller has to add, if the failure is a schema failure.
    pub fn missing_columns(&self) -> &[String] {
        match self {
            Self::MissingIdentifierColumns(names) | Self::MissingFeatureColumns(names) => {
                names.as_slice()
            }
            _ => &[],
        }
    }

    pub fn is_request_error(&self) -> bool {
        !matches!(self, Self::DependencyUnavailable(_))
    }
}

impl From<PolarsError> for PipelineError {
    fn from(err: PolarsError) -> Self {
        Self::Processing(err.to_string())
    }
}
