//! Runtime configuration utilities for noshow-predictor.

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;

use crate::{data::RecordSchema, logging::LogFormat, model::FetchPolicy};

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Cache root for downloaded model bundles.
    pub data_dir: PathBuf,
    /// Default folder for annotated outputs.
    pub outputs_dir: PathBuf,
    /// Artifact directory or `.zip` bundle.
    pub model_path: PathBuf,
    /// Remote `.zip` bundle; preferred over `model_path` when set.
    pub model_url: Option<String>,
    /// Per-attempt timeout for bundle downloads.
    pub fetch_timeout: Duration,
    /// Download attempts before giving up.
    pub fetch_retries: u32,
    /// Optional JSON replacement for the built-in record schema.
    pub schema_path: Option<PathBuf>,
    /// Largest accepted HTTP upload, in bytes.
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let outputs_dir = env::var("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./outputs"));
        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./models/noshow"));
        let model_url = env::var("MODEL_URL").ok().filter(|v| !v.trim().is_empty());
        let fetch_timeout = Duration::from_secs(parse_or("FETCH_TIMEOUT_SECS", 30));
        let fetch_retries = parse_or("FETCH_RETRIES", 3);
        let schema_path = env::var("SCHEMA_PATH").ok().map(PathBuf::from);
        let max_upload_bytes = parse_or::<usize>("MAX_UPLOAD_MB", 25) * 1024 * 1024;
        let log_format = env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        std::fs::create_dir_all(&data_dir).context("creating data dir")?;
        std::fs::create_dir_all(&outputs_dir).context("creating outputs dir")?;

        Ok(Self {
            data_dir,
            outputs_dir,
            model_path,
            model_url,
            fetch_timeout,
            fetch_retries,
            schema_path,
            max_upload_bytes,
            log_format,
        })
    }

    /// The record schema in force for this process.
    pub fn record_schema(&self) -> anyhow::Result<RecordSchema> {
        match &self.schema_path {
            Some(path) => RecordSchema::from_path(path),
            None => Ok(RecordSchema::clinic().clone()),
        }
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: self.fetch_timeout,
            retries: self.fetch_retries,
        }
    }

    /// Convenience helper for derived path segments.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }

    /// Convenience helper for derived output path segments.
    pub fn join_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.outputs_dir.join(path)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
