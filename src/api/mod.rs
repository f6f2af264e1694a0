//! HTTP layer: upload a table, download it annotated.

pub mod routes;
pub mod types;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Settings,
    data::RecordSchema,
    model::{ArtifactSource, ModelRegistry},
};

#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<RecordSchema>,
    pub registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(schema: RecordSchema, registry: ModelRegistry) -> Self {
        Self {
            schema: Arc::new(schema),
            registry: Arc::new(registry),
        }
    }
}

/// How the server is bound and where its model comes from.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub source: ArtifactSource,
    pub preload: bool,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/predict", post(routes::predict))
        .route("/schema", get(routes::schema))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, options: ServeOptions) -> Result<()> {
    let schema = settings.record_schema()?;
    let registry = ModelRegistry::new(options.source, &schema);
    if options.preload {
        registry
            .get()
            .await
            .context("preloading model artifacts")?;
    }
    let state = AppState::new(schema, registry);
    let app = router(state, settings.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", options.host, options.port).parse()?;
    info!(%addr, "serving noshow-predictor API");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
