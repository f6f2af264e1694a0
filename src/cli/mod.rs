//! Command-line interface wiring for noshow-predictor.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod fetch;
pub mod predict;
pub mod schema;
pub mod serve;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Appointment attendance predictor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Predict(args) => predict::run(args, settings).await,
            Commands::Serve(args) => serve::run(args, settings).await,
            Commands::FetchModel(args) => fetch::run(args, settings).await,
            Commands::Schema => schema::run(settings),
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Annotate an appointment table with attendance predictions.
    Predict(predict::Args),
    /// Serve the upload / download HTTP API.
    Serve(serve::Args),
    /// Download and validate the remote model bundle ahead of time.
    FetchModel(fetch::Args),
    /// Print the active record schema as JSON.
    Schema,
}
