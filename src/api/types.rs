//! Shared DTOs for JSON responses.

use serde::Serialize;

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDto {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl From<&PipelineError> for ErrorDto {
    fn from(err: &PipelineError) -> Self {
        ErrorDto {
            kind: err.kind().to_string(),
            message: err.to_string(),
            missing: err.missing_columns().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub model_loaded: bool,
}
