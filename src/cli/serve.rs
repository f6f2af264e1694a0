//! CLI entry-point for serving the prediction HTTP API.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{api, config::Settings, model::ArtifactSource};

/// Run the Axum server.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Port to bind (default 8080).
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// Host address, defaults to localhost.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Artifact directory or .zip bundle, overriding MODEL_PATH / MODEL_URL.
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Load the model before accepting requests and exit if it is unavailable.
    #[arg(long)]
    pub preload: bool,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let source = match args.model {
        Some(path) => ArtifactSource::local(path),
        None => ArtifactSource::from_settings(&settings),
    };
    let options = api::ServeOptions {
        host: args.host,
        port: args.port,
        source,
        preload: args.preload,
    };
    api::serve(settings, options).await
}
