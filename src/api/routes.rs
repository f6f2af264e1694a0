//! HTTP route handlers for Axum.

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use tracing::{error, warn};

use crate::{
    api::types::{ErrorDto, HealthDto},
    data::{tabular, RecordSchema, TableFormat},
    error::PipelineError,
    pipeline,
};

use super::AppState;

type ApiError = (StatusCode, Json<ErrorDto>);

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    /// Encoding of both the upload and the returned table.
    #[serde(default)]
    pub format: TableFormat,
}

pub async fn predict(
    State(state): State<AppState>,
    Query(query): Query<PredictQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let raw = tabular::read_bytes(body.to_vec(), query.format).map_err(reject)?;
    let mut result = pipeline::run_with_registry(&raw, &state.schema, &state.registry)
        .await
        .map_err(reject)?;
    let bytes = tabular::to_bytes(&mut result.table, query.format).map_err(reject)?;

    let filename = format!("predicciones_resultado.{}", query.format.extension());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, query.format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header("x-rows-dropped", result.summary.rows_dropped)
        .header("x-rows-predicted", result.summary.rows_predicted)
        .body(Body::from(bytes))
        .map_err(|err| reject(PipelineError::Processing(err.to_string())))
}

pub async fn schema(State(state): State<AppState>) -> Json<RecordSchema> {
    Json(state.schema.as_ref().clone())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok",
        model_loaded: state.registry.is_loaded(),
    })
}

fn reject(err: PipelineError) -> ApiError {
    let status = match &err {
        PipelineError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::MissingIdentifierColumns(_) | PipelineError::MissingFeatureColumns(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PipelineError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        PipelineError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if err.is_request_error() {
        warn!(kind = err.kind(), %err, "rejected upload");
    } else {
        error!(kind = err.kind(), %err, "prediction unavailable");
    }
    (status, Json(ErrorDto::from(&err)))
}
