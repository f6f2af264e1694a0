//! CLI entry-point for annotating a table with predictions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::{tabular, TableFormat},
    model::{ArtifactSource, ModelRegistry},
    pipeline::{self, RunSummary},
};

/// Args for the `predict` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Appointment table (.csv or .parquet).
    #[arg(long, short)]
    pub input: PathBuf,
    /// Destination table; defaults to OUTPUTS_DIR/predicciones_resultado.<ext>.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Artifact directory or .zip bundle, overriding MODEL_PATH.
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Remote .zip bundle, overriding MODEL_URL.
    #[arg(long, conflicts_with = "model")]
    pub model_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    input: &'a Path,
    output: &'a Path,
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: RunSummary,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let schema = settings.record_schema()?;
    let source = match (args.model, args.model_url) {
        (Some(path), _) => ArtifactSource::local(path),
        (None, Some(url)) => ArtifactSource::remote(url, &settings),
        (None, None) => ArtifactSource::from_settings(&settings),
    };
    let registry = ModelRegistry::new(source, &schema);

    let raw = tabular::read_path(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let mut result = pipeline::run_with_registry(&raw, &schema, &registry)
        .await
        .with_context(|| format!("predicting {}", args.input.display()))?;

    let output = match args.output {
        Some(path) => path,
        None => {
            let format = TableFormat::from_path(&args.input).unwrap_or_default();
            settings.join_output(format!("predicciones_resultado.{}", format.extension()))
        }
    };
    tabular::write_path(&mut result.table, &output)
        .with_context(|| format!("writing {}", output.display()))?;

    let summary_path = summary_path(&output);
    let summary = SummaryFile {
        input: &args.input,
        output: &output,
        generated_at: Utc::now(),
        summary: result.summary,
    };
    std::fs::write(&summary_path, serde_json::to_vec_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    info!(
        output = %output.display(),
        rows = result.summary.rows_predicted,
        dropped = result.summary.rows_dropped,
        "prediction completed"
    );
    println!("{}", output.display());
    Ok(())
}

fn summary_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".summary.json");
    PathBuf::from(name)
}
