mod common;

use std::{path::PathBuf, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use common::{ana, column_names, csv_bytes, string_column, without_column, ConstantModel, HEADER, OUTPUT_COLUMNS};
use noshow_predictor::{
    api::{self, AppState},
    data::{tabular, RecordSchema, TableFormat},
    model::{ArtifactSource, ModelRegistry, Prediction},
};
use serde_json::Value;
use tower::ServiceExt;

const LIMIT: usize = 1024 * 1024;

fn app_with(registry: ModelRegistry) -> Router {
    api::router(AppState::new(RecordSchema::clinic().clone(), registry), LIMIT)
}

fn attending_app() -> Router {
    app_with(ModelRegistry::with_model(Arc::new(ConstantModel(
        Prediction::Attended,
    ))))
}

fn upload(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_returns_annotated_attachment() {
    let response = attending_app()
        .oneshot(upload(csv_bytes(HEADER, &[ana()])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("predicciones_resultado.csv"));
    assert_eq!(response.headers()["x-rows-predicted"], "1");
    assert_eq!(response.headers()["x-rows-dropped"], "0");

    let bytes = to_bytes(response.into_body(), LIMIT).await.unwrap();
    let table = tabular::read_bytes(bytes.to_vec(), TableFormat::Csv).unwrap();
    assert_eq!(column_names(&table), OUTPUT_COLUMNS);
    assert_eq!(string_column(&table, "Predicción"), ["Asistencia"]);
}

#[tokio::test]
async fn missing_feature_is_unprocessable_and_named() {
    let (header, rows) = without_column("Mes", &[ana()]);
    let response = attending_app()
        .oneshot(upload(csv_bytes(&header, &rows)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    insta::assert_json_snapshot!(json_body(response).await, @r###"
    {
      "kind": "missing_feature_columns",
      "message": "missing feature columns: Month",
      "missing": [
        "Month"
      ]
    }
    "###);
}

#[tokio::test]
async fn missing_identifier_is_unprocessable() {
    let (header, rows) = without_column("Nº documento", &[ana()]);
    let response = attending_app()
        .oneshot(upload(csv_bytes(&header, &rows)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "missing_identifier_columns");
    assert_eq!(body["missing"][0], "Nº documento");
}

#[tokio::test]
async fn unavailable_model_is_service_unavailable() {
    let registry = ModelRegistry::new(
        ArtifactSource::Directory(PathBuf::from("/nonexistent/noshow-model")),
        RecordSchema::clinic(),
    );
    let response = app_with(registry)
        .oneshot(upload(csv_bytes(HEADER, &[ana()])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["kind"], "dependency_unavailable");
}

#[tokio::test]
async fn empty_upload_is_bad_request() {
    let response = attending_app().oneshot(upload(Vec::new())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "malformed_input");
}

#[tokio::test]
async fn health_reports_model_state() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = attending_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn schema_endpoint_lists_feature_order() {
    let request = Request::builder()
        .uri("/schema")
        .body(Body::empty())
        .unwrap();
    let response = attending_app().oneshot(request).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["feature_order"][0], "Age");
    assert_eq!(body["prediction_column"], "Predicción");
}
