//! CLI entry-point for pre-fetching the remote model bundle.

use anyhow::{anyhow, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    model::{artifacts, fetch},
};

/// Args for the `fetch-model` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Bundle URL, overriding MODEL_URL.
    #[arg(long)]
    pub url: Option<String>,
    /// Reuse an existing cached download instead of fetching again.
    #[arg(long)]
    pub keep_cached: bool,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let url = args
        .url
        .or_else(|| settings.model_url.clone())
        .ok_or_else(|| anyhow!("no bundle URL: pass --url or set MODEL_URL"))?;
    let schema = settings.record_schema()?;

    let path = fetch::fetch_bundle(
        &url,
        &settings.join_data("models"),
        settings.fetch_policy(),
        !args.keep_cached,
    )
    .await?;
    artifacts::load_bundle(&path, &schema.feature_order)?;

    info!(path = %path.display(), "model bundle validated");
    println!("{}", path.display());
    Ok(())
}
