//! Entry point wiring CLI dispatch to the prediction pipeline.

use anyhow::Result;
use noshow_predictor::{cli::Cli, config::Settings, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    logging::init_tracing(settings.log_format)?;

    info!(?cli, "starting command");
    cli.dispatch(settings).await
}
